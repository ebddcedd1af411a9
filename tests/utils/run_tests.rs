use itertools::Itertools;
use mixed_layer::{create_run, thermo::virtual_temperature, NamedSettings, Variable};

pub fn test_output_sizing(named: &NamedSettings) {
    let settings = &named.settings;
    let run = create_run(settings).unwrap();

    let expected = (settings.runtime / settings.dt_output).round() as usize + 1;
    assert_eq!(run.output().len(), expected, "{}", named.name);
    assert_eq!(run.output().row(0).unwrap().time, 0.0, "{}", named.name);
    assert_eq!(run.output().row(0).unwrap().h, settings.h, "{}", named.name);
}

pub fn test_determinism(named: &NamedSettings) {
    let run1 = create_run(&named.settings).unwrap();
    let run2 = create_run(&named.settings).unwrap();

    // Bit for bit.
    assert_eq!(run1.output(), run2.output(), "{}", named.name);
    assert_eq!(run1.final_state(), run2.final_state(), "{}", named.name);
}

pub fn test_growth(named: &NamedSettings) {
    let settings = &named.settings;
    if settings.wtheta <= 0.0 || settings.gammatheta <= 0.0 || settings.div != 0.0 {
        return;
    }

    let run = create_run(settings).unwrap();
    let h = run.output().column(Variable::H);

    assert!(
        h.iter().tuple_windows().all(|(h0, h1)| h1 >= h0),
        "{}: mixed layer shrank",
        named.name
    );
    assert!(h.last().unwrap() > &h[0], "{}", named.name);

    // A heated mixed layer warms up.
    let theta = run.output().column(Variable::Theta);
    assert!(theta.last().unwrap() > &theta[0], "{}", named.name);
}

pub fn test_derived_columns(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();

    for row in run.output().rows() {
        assert_eq!(row.thetav, virtual_temperature(row.theta, row.q, 0.0));
        assert_eq!(
            row.dthetav,
            virtual_temperature(row.theta + row.dtheta, row.q + row.dq, 0.0) - row.thetav
        );
        assert!(row.h > 0.0);
    }

    let times = run.output().column(Variable::Time);
    let dt_hours = named.settings.dt_output / 3600.0;
    for (i, t) in times.iter().enumerate() {
        approx::assert_abs_diff_eq!(*t, i as f64 * dt_hours, epsilon = 1.0e-9);
    }
}

pub fn test_times_utc(named: &NamedSettings) {
    let run = create_run(&named.settings).unwrap();

    match (named.settings.start_datetime(), run.times_utc()) {
        (Some(start), Some(times)) => {
            assert_eq!(times.len(), run.output().len());
            assert_eq!(times[0], start);
            assert!(times.iter().tuple_windows().all(|(t0, t1)| t1 > t0));
        }
        (None, None) => {}
        (start, times) => panic!(
            "{}: start {:?} does not match times {:?}",
            named.name, start, times
        ),
    }
}
