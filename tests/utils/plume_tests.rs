use metfor::{Kelvin, Meters, Quantity};
use mixed_layer::{create_run, launch_plume, NamedSettings, Termination};

// A few times spread over the run.
fn launch_times(named: &NamedSettings) -> Vec<f64> {
    let runtime = named.settings.runtime;
    let dt_output = named.settings.dt_output;
    vec![0.0, dt_output, (runtime / 2.0 / dt_output).round() * dt_output, runtime]
}

pub fn test_array_consistency(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();
    let top = run.output().last().unwrap().h * 2.0;
    let grid_levels = ((top + 5.0) / 10.0).ceil() as usize;

    for elapsed in launch_times(named) {
        let profile = launch_plume(&run, elapsed, 1.0);
        let len = profile.len();

        assert!(len > 0, "{} at {}", named.name, elapsed);
        assert!(len <= grid_levels, "{} at {}", named.name, elapsed);

        assert_eq!(profile.pressure.len(), len);
        assert_eq!(profile.exner.len(), len);
        assert_eq!(profile.theta.len(), len);
        assert_eq!(profile.q.len(), len);
        assert_eq!(profile.thetav.len(), len);
        assert_eq!(profile.saturated.len(), len);
        assert_eq!(profile.w.len(), len);

        assert_eq!(profile.altitude[0], Meters(0.0));
        for (i, z) in profile.altitude.iter().enumerate() {
            assert_eq!(z.unpack(), i as f64 * 10.0);
        }

        match profile.diagnostics.termination {
            Termination::ReachedTop => assert_eq!(len, grid_levels),
            Termination::Collapsed { altitude } => {
                assert_eq!(altitude.unpack(), len as f64 * 10.0)
            }
            Termination::OutsideRun => panic!("{} at {} is in the run", named.name, elapsed),
        }
    }
}

pub fn test_plume_forcing(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();

    for elapsed in launch_times(named) {
        let row = run.row_at_elapsed(elapsed).unwrap();

        let profile = launch_plume(&run, elapsed, 1.0);
        assert_eq!(
            profile.theta[0],
            Kelvin(row.theta + named.settings.dtheta_plume)
        );
        assert_eq!(profile.q[0], row.q + named.settings.dq_plume);

        // A stronger fire starts warmer.
        let bigger = launch_plume(&run, elapsed, 3.0);
        assert!(bigger.theta[0] > profile.theta[0]);
    }
}

pub fn test_outside_run(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();
    let past_the_end = named.settings.runtime + named.settings.dt_output;

    for &elapsed in &[-named.settings.dt_output, past_the_end, std::f64::NAN] {
        let profile = launch_plume(&run, elapsed, 1.0);
        assert!(profile.is_empty());
        assert!(profile.condensation_level().is_none());
        assert!(profile.max_height().is_none());
        assert_eq!(profile.diagnostics.termination, Termination::OutsideRun);
    }
}

pub fn test_skew_t(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();

    for elapsed in launch_times(named) {
        let env = run.skew_t_environment(elapsed).unwrap();
        assert_eq!(env.len(), 501);
        assert!(env[0].pressure > env[500].pressure);
        assert!(env[0].dew_point.is_some());

        let profile = launch_plume(&run, elapsed, 1.0);
        let coords = profile.skew_t_coords();
        assert_eq!(coords.len(), profile.len());
        assert_eq!(coords[0].0, env[0].pressure);
    }
}
