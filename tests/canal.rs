// Integration tests for whole-program runs: reference return, multi-canal
// execution, the wire JSON shape, and configuration wiring.

#[cfg(test)]
mod tests {
    use std::io::Write;

    use ncplot_rs::{
        load_config, parse_program, CanalError, ConfigError, Machine, MachineConfig, MoveKind,
        PlotResponse, Point,
    };

    fn test_config() -> MachineConfig {
        let mut config = MachineConfig::default();
        config.feed.default_feed = 120.0;
        config.feed.rapid_rate = 6000.0;
        config.reference.insert("X".to_string(), 100.0);
        config.reference.insert("Z".to_string(), 50.0);
        config
    }

    #[test]
    fn reference_return_remaps_aux_letters_and_applies_offsets() {
        let machine = Machine::from_config(&test_config()).unwrap();
        // G50 registers an X work offset; G28 U10 must behave as G28 X10:
        // through the intermediate point at X=10, then to the reference
        // position plus the active offset.
        let nodes = parse_program("G50 X2\nG90 G28 U10", 0).unwrap();
        let result = machine.run_programs(vec![nodes]).remove(0).unwrap();

        assert_eq!(result.segments.len(), 1);
        let segment = &result.segments[0];
        assert_eq!(segment.kind, MoveKind::Rapid);
        assert_eq!(
            segment.points,
            vec![Point::new(0.0, 0.0, 0.0), Point::new(102.0, 0.0, 50.0)]
        );
        assert_eq!(result.variables["X"], 102.0);
        assert_eq!(result.variables["Z"], 50.0);
        assert_eq!(result.variables["offset.X"], 2.0);

        // Travel time covers the pass through the intermediate point at
        // X=10 before the run to the offset reference, at the rapid rate.
        let travel = 10.0 + (92.0_f64 * 92.0 + 50.0 * 50.0).sqrt();
        let expected = travel / (6000.0 / 60.0);
        assert!((result.duration - expected).abs() < 1e-9);
    }

    #[test]
    fn reference_return_without_words_is_a_direct_rapid() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let nodes = parse_program("G28", 0).unwrap();
        let result = machine.run_programs(vec![nodes]).remove(0).unwrap();

        let segment = &result.segments[0];
        // No intermediate point: exactly start and reference.
        assert_eq!(
            segment.points,
            vec![Point::new(0.0, 0.0, 0.0), Point::new(100.0, 0.0, 50.0)]
        );
    }

    #[test]
    fn unknown_commands_are_absorbed_silently() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let nodes = parse_program("M30\nG99", 0).unwrap();
        let result = machine.run_programs(vec![nodes]).remove(0).unwrap();
        assert!(result.segments.is_empty());
        assert_eq!(result.duration, 0.0);
        assert!(result.diagnostics.is_empty());
    }

    #[test]
    fn modal_state_persists_across_the_whole_program() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let program = "G90 G01 X10 F600\nG91\nX5\nX5\nG90 X0";
        let nodes = parse_program(program, 0).unwrap();
        let result = machine.run_programs(vec![nodes]).remove(0).unwrap();

        // 10 + 5 + 5 + 20 units, all linear at 600 units/min.
        assert_eq!(result.segments.len(), 4);
        assert_eq!(result.variables["X"], 0.0);
        assert_eq!(result.duration, 4.0);
    }

    #[test]
    fn canals_run_independently_in_parallel() {
        let mut config = test_config();
        config.canals.push(ncplot_rs::config::CanalConfig {
            name: "C2".to_string(),
            handlers: vec!["setup".to_string(), "motion".to_string()],
        });
        let machine = Machine::from_config(&config).unwrap();
        assert_eq!(machine.canal_count(), 2);

        let programs = vec![
            parse_program("G90 G0 X10", 0).unwrap(),
            parse_program("G90 G0 Y5", 1).unwrap(),
        ];
        let results = machine.run_programs(programs);
        let first = results[0].as_ref().unwrap();
        let second = results[1].as_ref().unwrap();

        assert_eq!(first.variables["X"], 10.0);
        assert_eq!(first.variables["Y"], 0.0);
        assert_eq!(second.variables["X"], 0.0);
        assert_eq!(second.variables["Y"], 5.0);
    }

    #[test]
    fn node_addressed_to_the_wrong_canal_aborts_the_run() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let nodes = parse_program("G0 X1", 5).unwrap();
        let result = machine.run_programs(vec![nodes]).remove(0);
        assert_eq!(
            result.unwrap_err(),
            CanalError::CanalMismatch { line: 1, expected: 0, found: 5 }
        );
    }

    #[test]
    fn segment_without_duration_violates_the_result_contract() {
        use ncplot_rs::{
            Canal, CommandHandler, CommandNode, Diagnostics, ExecOutput, HandlerChain,
            MachineState, ToolPathSegment,
        };

        struct BrokenHandler;
        impl CommandHandler for BrokenHandler {
            fn matches(&self, _node: &CommandNode) -> bool {
                true
            }
            fn handle(
                &self,
                node: &mut CommandNode,
                _state: &mut MachineState,
                _diags: &mut Diagnostics,
            ) -> Result<ExecOutput, CanalError> {
                Ok(ExecOutput {
                    segment: Some(ToolPathSegment {
                        kind: MoveKind::Linear,
                        line: node.line,
                        tool: 0,
                        points: vec![Point::new(0.0, 0.0, 0.0), Point::new(1.0, 0.0, 0.0)],
                    }),
                    duration: None,
                })
            }
        }

        let chain = HandlerChain::new(vec![Box::new(BrokenHandler)]);
        let mut canal = Canal::new("C1", 0, MachineState::new(), chain);
        let nodes = parse_program("G1 X1", 0).unwrap();
        assert_eq!(canal.run(nodes).unwrap_err(), CanalError::InvalidOutcome { line: 1 });
    }

    #[test]
    fn response_matches_the_wire_contract() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let nodes = parse_program("G90 G01 X10 F600\nG02 X20 Y0 I5", 0).unwrap();
        let results = machine.run_programs(vec![nodes]);
        let response = PlotResponse::from_results(results);

        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["success"], serde_json::json!(true));
        let canal = &value["canals"]["C1"];
        assert_eq!(canal["segments"][0]["kind"], serde_json::json!("linear"));
        assert_eq!(canal["segments"][1]["kind"], serde_json::json!("arc_cw"));
        assert_eq!(canal["segments"][0]["points"][0]["x"], serde_json::json!(0.0));
        assert_eq!(canal["segments"][0]["points"][1]["x"], serde_json::json!(10.0));
        assert!(canal["variables"]["X"].is_number());
        assert!(canal["duration"].is_number());
    }

    #[test]
    fn failed_canal_yields_an_error_response() {
        let machine = Machine::from_config(&test_config()).unwrap();
        let nodes = parse_program("G0 X1", 3).unwrap();
        let results = machine.run_programs(vec![nodes]);
        let response = PlotResponse::from_results(results);
        assert!(!response.success);
        assert!(response.error.is_some());
        assert!(response.canals.is_empty());
    }

    #[test]
    fn config_loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[machine]
name = "iso-turn"

[interpolation]
max_segment = 0.25

[feed]
default_feed = 200.0
rapid_rate = 12000.0

[reference]
X = 100.0
Z = 50.0

[[canals]]
name = "MAIN"
handlers = ["setup", "motion"]

[[canals]]
name = "SUB"
"#
        )
        .unwrap();

        let config = load_config(file.path()).unwrap();
        assert_eq!(config.machine.name, "iso-turn");
        assert_eq!(config.interpolation.max_segment, 0.25);
        assert_eq!(config.canals.len(), 2);
        assert_eq!(config.canals[1].name, "SUB");
        // Unnamed handler list falls back to the default chain.
        assert_eq!(config.canals[1].handlers, vec!["setup", "motion"]);

        let machine = Machine::from_config(&config).unwrap();
        assert_eq!(machine.canal_count(), 2);
    }

    #[test]
    fn unknown_handler_name_is_a_config_error() {
        let mut config = test_config();
        config.canals[0].handlers = vec!["bogus".to_string()];
        match Machine::from_config(&config).err() {
            Some(ConfigError::UnknownHandler { canal, handler }) => {
                assert_eq!(canal, "C1");
                assert_eq!(handler, "bogus");
            }
            other => panic!("expected UnknownHandler, got {other:?}"),
        }
    }

    #[test]
    fn zero_max_segment_is_a_config_error() {
        // An arc sampled at zero resolution would ask for an unbounded
        // number of steps, so the machine refuses to build at all.
        let mut config = test_config();
        config.interpolation.max_segment = 0.0;
        assert!(matches!(
            Machine::from_config(&config),
            Err(ConfigError::NonPositiveValue { field: "interpolation.max_segment", .. })
        ));
    }

    #[test]
    fn empty_canal_list_is_a_config_error() {
        let mut config = test_config();
        config.canals.clear();
        assert!(matches!(Machine::from_config(&config), Err(ConfigError::NoCanals)));
    }
}
