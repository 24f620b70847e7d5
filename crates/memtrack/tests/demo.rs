#[cfg(test)]
pub mod tests {
    use std::process::Command;

    fn demo(args: &[&str]) -> std::process::Output {
        Command::new(env!("CARGO_BIN_EXE_memtrack-demo"))
            .args(args)
            .env("NO_COLOR", "1")
            .env_remove("MEMTRACK_JSON")
            .env_remove("MEMTRACK_CAPACITY")
            .env_remove("MEMTRACK_TRACKING")
            .output()
            .expect("Failed to execute command")
    }

    // cargo run -p memtrack --bin memtrack-demo -- --format text
    #[test]
    fn test_text_output() {
        let output = demo(&["--format", "text"]);

        assert!(
            output.status.success(),
            "Process did not exit successfully.\n\nstderr:\n{}",
            String::from_utf8_lossy(&output.stderr)
        );

        let stdout = String::from_utf8_lossy(&output.stdout);
        let all_expected = [
            "--- MEMORY ALLOCATION REPORT ---",
            "20 bytes, Type: Dynamic, Status: Allocated, Seq: 1",
            "50 bytes, Type: Temporary, Status: Allocated, Seq: 2",
            "Total Blocks: 2\nTotal Allocated: 70 bytes",
            "Total Blocks: 0\nTotal Allocated: 0 bytes",
        ];
        for expected in all_expected {
            assert!(
                stdout.contains(expected),
                "Expected:\n{expected}\n\nGot:\n{stdout}",
            );
        }
    }

    // cargo run -p memtrack --bin memtrack-demo
    #[test]
    fn test_table_output() {
        let output = demo(&[]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let all_expected = [
            "[memtrack]",
            "Slot",
            "Origin",
            "Dynamic",
            "Temporary",
            "2 blocks, 70 B (70 bytes)",
            "No outstanding blocks",
        ];
        for expected in all_expected {
            assert!(
                stdout.contains(expected),
                "Expected:\n{expected}\n\nGot:\n{stdout}",
            );
        }
    }

    // cargo run -p memtrack --bin memtrack-demo -- --format json --leak
    #[test]
    fn test_json_output_with_leak() {
        let output = demo(&["--format", "json", "--leak"]);
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        let reports: Vec<serde_json::Value> = stdout
            .lines()
            .map(|line| serde_json::from_str(line).expect("each line is a JSON report"))
            .collect();

        assert_eq!(reports.len(), 2);
        for report in &reports {
            assert_eq!(report["total_blocks"], 2);
            assert_eq!(report["total_bytes"], 70);
        }
        assert_eq!(reports[0], reports[1]);
    }

    // MEMTRACK_CAPACITY=1 cargo run -p memtrack --bin memtrack-demo
    #[test]
    fn test_capacity_exhausted_fails() {
        let output = demo(&["--capacity", "1"]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(
            stderr.contains("memory tracker full (1 blocks)"),
            "Got:\n{stderr}"
        );
    }

    // MEMTRACK_JSON=1 cargo run -p memtrack --bin memtrack-demo -- --format text
    #[test]
    fn test_json_env_overrides_format_flag() {
        let output = Command::new(env!("CARGO_BIN_EXE_memtrack-demo"))
            .args(["--format", "text", "--leak"])
            .env("MEMTRACK_JSON", "1")
            .env_remove("MEMTRACK_CAPACITY")
            .env_remove("MEMTRACK_TRACKING")
            .output()
            .expect("Failed to execute command");
        assert!(output.status.success());

        let stdout = String::from_utf8_lossy(&output.stdout);
        assert!(!stdout.contains("--- MEMORY ALLOCATION REPORT ---"), "Got:\n{stdout}");
        for line in stdout.lines() {
            let report: serde_json::Value =
                serde_json::from_str(line).expect("each line is a JSON report");
            assert_eq!(report["total_bytes"], 70);
        }
    }

    #[test]
    fn test_invalid_format_rejected() {
        let output = demo(&["--format", "yaml"]);

        assert!(!output.status.success());
        let stderr = String::from_utf8_lossy(&output.stderr);
        assert!(stderr.contains("unknown format 'yaml'"), "Got:\n{stderr}");
    }
}
