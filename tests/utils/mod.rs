use mixed_layer::SettingsRecord;
use std::{fs::read_to_string, path::PathBuf};

pub mod plume_tests;
pub mod run_tests;

#[allow(unused_macros)] // False alarm
macro_rules! test_file {
    ($test_mod_name:ident, $fname:expr) => {
        mod $test_mod_name {
            use crate::utils;
            use mixed_layer::SettingsRecord;

            fn load_data() -> SettingsRecord {
                utils::load_test_file($fname)
            }

            mod runs {
                use super::load_data;
                use crate::utils::run_tests;

                #[test]
                fn output_sizing() {
                    for named in &load_data().settings {
                        run_tests::test_output_sizing(named);
                    }
                }

                #[test]
                fn determinism() {
                    for named in &load_data().settings {
                        run_tests::test_determinism(named);
                    }
                }

                #[test]
                fn growth() {
                    for named in &load_data().settings {
                        run_tests::test_growth(named);
                    }
                }

                #[test]
                fn derived_columns() {
                    for named in &load_data().settings {
                        run_tests::test_derived_columns(named);
                    }
                }

                #[test]
                fn times_utc() {
                    for named in &load_data().settings {
                        run_tests::test_times_utc(named);
                    }
                }
            }

            mod plumes {
                use super::load_data;
                use crate::utils::plume_tests;

                #[test]
                fn array_consistency() {
                    for named in &load_data().settings {
                        plume_tests::test_array_consistency(named);
                    }
                }

                #[test]
                fn plume_forcing() {
                    for named in &load_data().settings {
                        plume_tests::test_plume_forcing(named);
                    }
                }

                #[test]
                fn outside_run() {
                    for named in &load_data().settings {
                        plume_tests::test_outside_run(named);
                    }
                }

                #[test]
                fn skew_t() {
                    for named in &load_data().settings {
                        plume_tests::test_skew_t(named);
                    }
                }
            }
        }
    };
}

pub fn load_test_file(fname: &str) -> SettingsRecord {
    let mut test_path = PathBuf::new();
    test_path.push("test_data");
    test_path.push(fname);

    let contents = read_to_string(&test_path)
        .unwrap_or_else(|err| panic!("Error reading file {:#?}: {}", test_path, err));

    SettingsRecord::from_json(&contents)
        .unwrap_or_else(|err| panic!("Error parsing file {:#?}: {}", test_path, err))
}
