use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use serde_json::Value;

#[derive(Parser, Debug)]
#[command(name = "pyxctl", about = "PyX Live Tree Client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Websocket endpoint of the server
    #[arg(long, global = true, default_value = "ws://127.0.0.1:7004/ws")]
    pub url: String,

    /// Log filter, e.g. "warn" or "pyx_runtime=debug"
    #[arg(long, global = true, default_value = "warn")]
    pub log_level: String,

    /// Export spans through OpenTelemetry (stdout exporter)
    #[arg(long, global = true, default_value_t = false)]
    pub otel: bool,

    /// Session configuration file (JSON)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Print output in pretty (indented) format
    #[arg(long, global = true, default_value_t = false)]
    pub pretty: bool,

    /// Set the output format (standard, json, yaml), default is standard
    #[arg(long, short = 'o', global = true, value_enum, default_value_t = OutputFormat::Standard)]
    pub output: OutputFormat,
}

#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum OutputFormat {
    Standard,
    Json,
    Yaml
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Mount the root resource and print the tree every time it changes
    Watch,

    /// Call a remote function and wait for it to complete
    Invoke(InvokeArgs),
}

#[derive(Args, Debug)]
pub struct InvokeArgs {
    /// Resource id of the function
    #[arg()]
    pub function: String,

    /// Call argument as JSON, repeat for each positional argument
    #[arg(long = "arg", value_parser = parse_json)]
    pub args: Vec<Value>,

    /// Preload plan as JSON, e.g. '{"[0]": null}'
    #[arg(long = "plan", value_parser = parse_json)]
    pub plan: Option<Value>,

    /// Seconds to wait for the function to return
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,
}

fn parse_json(s: &str) -> Result<Value, String> {
    serde_json::from_str(s).map_err(|e| format!("Invalid JSON '{}': {}", s, e))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_invoke_arguments() {
        let cli = Cli::parse_from([
            "pyxctl", "-o", "json", "invoke", "f1",
            "--arg", "1",
            "--arg", r#"{"a": [2]}"#,
            "--plan", r#"{"[0]": null}"#,
        ]);

        assert_eq!(cli.output, OutputFormat::Json);
        match cli.command {
            Command::Invoke(args) => {
                assert_eq!(args.function, "f1");
                assert_eq!(args.args, vec![json!(1), json!({ "a": [2] })]);
                assert_eq!(args.plan, Some(json!({ "[0]": null })));
                assert_eq!(args.timeout, 30);
            }
            other => panic!("expected invoke, got {:?}", other),
        }
    }

    #[test]
    fn rejects_invalid_json_arguments() {
        let result = Cli::try_parse_from(["pyxctl", "invoke", "f1", "--arg", "{nope"]);

        assert!(result.is_err());
    }

    #[test]
    fn watch_uses_defaults() {
        let cli = Cli::parse_from(["pyxctl", "watch"]);

        assert!(matches!(cli.command, Command::Watch));
        assert_eq!(cli.url, "ws://127.0.0.1:7004/ws");
        assert_eq!(cli.output, OutputFormat::Standard);
    }
}
