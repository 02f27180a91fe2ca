//! Heart Disease API CLI Module
//!
//! Command-line interface for serving, offline scoring, artifact inspection
//! and the interactive patient form.

use clap::{Parser, Subcommand};
use colored::*;
use polars::prelude::*;
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::inference::{InferenceEngine, PredictionBatch, PredictionResult};
use crate::model::ModelArtifact;
use crate::schema::{FeatureKind, FeatureSchema, FeatureSpec};
use crate::server::{ServerConfig, SERVICE_NAME};

// ─── Styling helpers ───────────────────────────────────────────────────────────

const W: usize = 58; // box inner width

fn dim(s: &str) -> ColoredString   { s.truecolor(100, 100, 100) }
fn accent(s: &str) -> ColoredString { s.truecolor(120, 170, 255) }
fn muted(s: &str) -> ColoredString  { s.truecolor(140, 140, 140) }
fn ok(s: &str) -> ColoredString     { s.truecolor(100, 210, 120) }
fn alert(s: &str) -> ColoredString  { s.truecolor(240, 110, 100) }

fn line_box_top()    { println!("  {}", dim("┌─────────────────────────────────────────────────────────┐")); }
fn line_box_bottom() { println!("  {}", dim("└─────────────────────────────────────────────────────────┘")); }
fn line_box_sep()    { println!("  {}", dim("├─────────────────────────────────────────────────────────┤")); }

fn line_box(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let pad = W.saturating_sub(visible_len);
    println!("  {}  {}{} {}", dim("│"), content, " ".repeat(pad), dim("│"));
}

fn line_box_center(content: &str) {
    let visible_len = strip_ansi(content).chars().count();
    let total_pad = W.saturating_sub(visible_len);
    let left = total_pad / 2;
    let right = total_pad - left;
    println!("  {}  {}{}{} {}", dim("│"), " ".repeat(left), content, " ".repeat(right), dim("│"));
}

fn line_box_empty() { line_box(""); }

fn strip_ansi(s: &str) -> String {
    let mut out = String::new();
    let mut in_escape = false;
    for c in s.chars() {
        if c == '\x1b' { in_escape = true; continue; }
        if in_escape { if c == 'm' { in_escape = false; } continue; }
        out.push(c);
    }
    out
}

fn kv(key: &str, val: &str) -> String {
    format!("{} {}", muted(key), val.white())
}

fn step_run(msg: &str) {
    print!("  {} {}... ", accent("›"), msg);
}

fn step_done(detail: &str) {
    println!("{} {}", ok("done"), dim(detail));
}

fn section(title: &str) {
    println!();
    println!("  {}", title.white().bold());
    println!("  {}", dim(&"─".repeat(56)));
}

fn wait_enter() {
    println!();
    println!("  {}", dim("press enter to continue"));
    let mut input = String::new();
    let _ = std::io::stdin().read_line(&mut input);
}

fn theme() -> dialoguer::theme::ColorfulTheme {
    use dialoguer::console::{style, Style};

    dialoguer::theme::ColorfulTheme {
        active_item_prefix: style("  ›".to_string()).for_stderr().cyan(),
        active_item_style: Style::new().for_stderr().white().bold(),
        inactive_item_prefix: style("   ".to_string()).for_stderr(),
        inactive_item_style: Style::new().for_stderr().color256(245),
        prompt_prefix: style("  ?".to_string()).for_stderr().color256(111),
        prompt_style: Style::new().for_stderr().white().bold(),
        ..dialoguer::theme::ColorfulTheme::default()
    }
}

// ─── CLI definition ────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(name = "heart-api")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Heart disease classification service")]
#[command(long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the prediction API
    Serve {
        /// Server host (defaults to API_HOST or 0.0.0.0)
        #[arg(long)]
        host: Option<String>,

        /// Server port (defaults to API_PORT or 8000)
        #[arg(short, long)]
        port: Option<u16>,

        /// Model artifact (defaults to MODEL_PATH)
        #[arg(short, long)]
        model: Option<PathBuf>,
    },

    /// Score a CSV or JSON file offline
    Predict {
        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,

        /// Input data file (CSV, or JSON list / {"instances": [...]})
        #[arg(short, long)]
        data: PathBuf,

        /// Write predictions as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Show model artifact metadata
    Inspect {
        /// Model artifact
        #[arg(short, long)]
        model: PathBuf,
    },

    /// Fill in a patient record and send it to a running server
    Form {
        /// Base URL of the API
        #[arg(short, long, default_value = "http://localhost:8000")]
        url: String,
    },
}

// ─── Data loading ──────────────────────────────────────────────────────────────

pub fn load_data(path: &Path) -> anyhow::Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_infer_schema_length(Some(1000))
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(path.to_path_buf()))?
        .finish()?;
    Ok(df)
}

/// Accept either a bare list of records or a `{"instances": [...]}` body
pub fn load_instances(path: &Path) -> anyhow::Result<Vec<Value>> {
    let raw = std::fs::read_to_string(path)?;
    match serde_json::from_str::<Value>(&raw)? {
        Value::Array(instances) => Ok(instances),
        Value::Object(mut body) => match body.remove("instances") {
            Some(Value::Array(instances)) => Ok(instances),
            _ => anyhow::bail!("{} has no 'instances' list", path.display()),
        },
        _ => anyhow::bail!("{} must hold a JSON list or an object with 'instances'", path.display()),
    }
}

fn load_engine(model_path: &Path) -> anyhow::Result<InferenceEngine> {
    let schema = Arc::new(FeatureSchema::heart_disease());
    let artifact = ModelArtifact::load(model_path, &schema)?;
    Ok(InferenceEngine::new(schema, Arc::new(artifact)))
}

/// Parse one form answer into the JSON value sent for that field
pub fn parse_field_input(spec: &FeatureSpec, input: &str) -> std::result::Result<Value, String> {
    let value: f64 = input
        .trim()
        .parse()
        .map_err(|_| "enter a number".to_string())?;
    if !value.is_finite() {
        return Err("enter a finite number".to_string());
    }
    if spec.kind == FeatureKind::Integer && value.fract() != 0.0 {
        return Err("enter a whole number".to_string());
    }
    if !spec.contains(value) {
        return Err(format!(
            "must be between {} and {}",
            spec.format_bound(spec.min),
            spec.format_bound(spec.max)
        ));
    }

    Ok(match spec.kind {
        FeatureKind::Integer => Value::from(value as i64),
        FeatureKind::Real => Value::from(value),
    })
}

fn print_predictions(batch: &PredictionBatch) {
    println!();
    println!("  {:>5} {:>11} {:>8}  {}", muted("Row"), muted("Prediction"), muted("Risk"), muted("Diagnosis"));
    println!("  {}", dim(&"─".repeat(52)));
    for (i, result) in batch.predictions().iter().enumerate() {
        let diagnosis = result.diagnosis.as_str();
        let diagnosis = if result.label == 1 { alert(diagnosis) } else { ok(diagnosis) };
        println!(
            "  {:>5} {:>11} {:>7.1}%  {}",
            i,
            result.label,
            result.disease_risk() * 100.0,
            diagnosis
        );
    }
    println!("  {}", dim(&"─".repeat(52)));
}

// ─── Commands ──────────────────────────────────────────────────────────────────

pub fn cmd_predict(
    model_path: &Path,
    data_path: &Path,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    section("Predict");

    step_run("Loading model");
    let start = Instant::now();
    let engine = load_engine(model_path)?;
    step_done(&format!("{} in {:?}", engine.classifier().describe(), start.elapsed()));

    let ext = data_path.extension().and_then(|e| e.to_str()).unwrap_or("");
    step_run("Scoring");
    let start = Instant::now();
    let batch = match ext {
        "csv" => engine.predict_frame(&load_data(data_path)?)?,
        "json" => engine.predict_batch(&load_instances(data_path)?)?,
        _ => anyhow::bail!("Unsupported file format: {}", ext),
    };
    step_done(&format!("{} rows in {:?}", batch.count(), start.elapsed()));

    print_predictions(&batch);

    let positives = batch.predictions().iter().filter(|r| r.label == 1).count();
    println!();
    println!("  {:<16} {}", muted("Rows"), batch.count().to_string().white().bold());
    println!("  {:<16} {}", muted("Heart disease"), positives.to_string().white().bold());

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&batch)?)?;
        println!("  {:<16} {}", muted("Saved"), path.display());
    }

    println!();
    Ok(())
}

pub fn cmd_inspect(model_path: &Path) -> anyhow::Result<()> {
    section("Model");

    let schema = FeatureSchema::heart_disease();
    let artifact = ModelArtifact::load(model_path, &schema)?;
    let yes_no = |b: bool| if b { "yes" } else { "no" };

    println!("  {:<16} {}", muted("File"), model_path.display());
    println!("  {:<16} {}", muted("Name"), artifact.name);
    println!("  {:<16} {}", muted("Version"), artifact.version);
    println!("  {:<16} {}", muted("Estimator"), artifact.estimator.kind());
    println!("  {:<16} {}", muted("Probabilities"), yes_no(artifact.estimator.supports_proba()));
    println!("  {:<16} {}", muted("Imputer"), yes_no(artifact.imputer.is_some()));
    println!("  {:<16} {}", muted("Scaler"), yes_no(artifact.scaler.is_some()));

    section("Features");
    println!("  {:<10} {:<8} {:>6} {:>6}  {}", muted("Name"), muted("Kind"), muted("Min"), muted("Max"), muted("Description"));
    for spec in schema.iter() {
        let kind = match spec.kind {
            FeatureKind::Integer => "integer",
            FeatureKind::Real => "real",
        };
        println!(
            "  {:<10} {:<8} {:>6} {:>6}  {}",
            spec.name.white(),
            kind,
            spec.format_bound(spec.min),
            spec.format_bound(spec.max),
            dim(&spec.description)
        );
    }

    println!();
    Ok(())
}

/// Upper bound on a single form submission, connect through response body
const FORM_TIMEOUT: Duration = Duration::from_secs(30);

fn http_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

pub async fn cmd_form(url: &str) -> anyhow::Result<()> {
    use dialoguer::Input;

    section("Patient Record");

    let theme = theme();
    let schema = FeatureSchema::heart_disease();
    let mut record = serde_json::Map::new();

    for spec in schema.iter() {
        let prompt = format!(
            "{} ({}, {}-{})",
            spec.name,
            spec.description,
            spec.format_bound(spec.min),
            spec.format_bound(spec.max)
        );
        let answer: String = Input::with_theme(&theme)
            .with_prompt(prompt)
            .validate_with(|input: &String| parse_field_input(spec, input).map(|_| ()))
            .interact_text()?;
        let value = parse_field_input(spec, &answer).map_err(|e| anyhow::anyhow!(e))?;
        record.insert(spec.name.clone(), value);
    }

    let endpoint = format!("{}/predict/single", url.trim_end_matches('/'));
    step_run(&format!("Sending → {}", endpoint));
    let response = http_client(FORM_TIMEOUT)?
        .post(&endpoint)
        .json(&Value::Object(record))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body: Value = response.json().await.unwrap_or(Value::Null);
        println!("{}", alert("failed"));
        let message = body
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no error message");
        anyhow::bail!("server returned {}: {}", status, message);
    }

    let result: PredictionResult = response.json().await?;
    step_done(&status.to_string());

    section("Result");
    let diagnosis = if result.label == 1 {
        alert(result.diagnosis.as_str()).bold()
    } else {
        ok(result.diagnosis.as_str()).bold()
    };
    println!("  {:<16} {}", muted("Diagnosis"), diagnosis);
    println!("  {:<16} {:.1}%", muted("Disease risk"), result.disease_risk() * 100.0);
    println!("  {:<16} {:.1}%", muted("No disease"), result.probabilities[0] * 100.0);
    println!();
    Ok(())
}

// ─── Serve ─────────────────────────────────────────────────────────────────────

pub async fn cmd_serve(
    host: Option<String>,
    port: Option<u16>,
    model: Option<PathBuf>,
) -> anyhow::Result<()> {
    use crate::server::run_server;

    let defaults = ServerConfig::default();
    let config = ServerConfig {
        host: host.unwrap_or(defaults.host),
        port: port.unwrap_or(defaults.port),
        model_path: model.unwrap_or(defaults.model_path),
        database_url: defaults.database_url,
    };

    println!();
    line_box_top();
    line_box_empty();
    line_box_center(&format!("{}", SERVICE_NAME.white().bold()));
    line_box_center(&format!("{}", dim(&format!("v{}", env!("CARGO_PKG_VERSION")))));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box(&kv("Model  ", &config.model_path.display().to_string()));
    line_box(&kv("Predict", &format!("http://{}:{}/predict", config.host, config.port)));
    line_box(&kv("Single ", &format!("http://{}:{}/predict/single", config.host, config.port)));
    line_box(&kv("Health ", &format!("http://{}:{}/health", config.host, config.port)));
    line_box_empty();
    line_box_sep();
    line_box_empty();
    line_box_center(&format!("{}", dim("ctrl+c to stop")));
    line_box_empty();
    line_box_bottom();
    println!();

    run_server(config).await
}

// ─── Interactive mode ──────────────────────────────────────────────────────────

fn print_banner() {
    println!();
    println!();
    println!("       {}", "♥  heart-api".truecolor(240, 110, 100).bold());
    println!();
    println!("       {}", dim(&format!("{}  ·  v{}  ·  rust", SERVICE_NAME, env!("CARGO_PKG_VERSION"))));
    println!();
}

fn show_help() {
    section("Commands");

    let cmds: &[(&str, &str)] = &[
        ("heart-api", "Interactive launcher (default)"),
        ("heart-api serve", "Start the prediction API"),
        ("heart-api serve -p 9000", "Serve on custom port"),
        ("heart-api predict -m model.json -d in.csv", "Score a file offline"),
        ("heart-api inspect -m model.json", "Show artifact metadata"),
        ("heart-api form", "Patient form against a server"),
    ];

    for (cmd, desc) in cmds {
        println!("  {:<44} {}", cmd.white(), muted(desc));
    }

    section("Endpoints");

    let endpoints: &[(&str, &str)] = &[
        ("GET  /health", "Service and database status"),
        ("GET  /schema", "Feature names and ranges"),
        ("POST /predict", "Batch prediction"),
        ("POST /predict/single", "Validated single prediction"),
    ];

    for (route, desc) in endpoints {
        println!("  {:<44} {}", route.truecolor(120, 170, 255), muted(desc));
    }

    println!();
}

pub async fn cmd_interactive() -> anyhow::Result<()> {
    use dialoguer::Select;

    print_banner();

    let theme = theme();
    let defaults = ServerConfig::default();

    loop {
        let items = &[
            "Start Server          prediction api",
            "Patient Form          score one record via the api",
            "Inspect Model         artifact metadata",
            "Help                  commands & endpoints",
            "Exit",
        ];

        println!();
        let sel = Select::with_theme(&theme)
            .with_prompt("What would you like to do")
            .items(items)
            .default(0)
            .interact_opt()?;

        match sel {
            Some(0) => {
                cmd_serve(None, None, None).await?;
                break;
            }
            Some(1) => {
                let url = format!("http://localhost:{}", defaults.port);
                if let Err(e) = cmd_form(&url).await {
                    println!("  {} {}", alert("error"), e);
                }
                wait_enter();
            }
            Some(2) => {
                if let Err(e) = cmd_inspect(&defaults.model_path) {
                    println!("  {} {}", alert("error"), e);
                }
                wait_enter();
            }
            Some(3) => {
                show_help();
                wait_enter();
            }
            Some(4) | None => {
                println!();
                println!("  {}", dim("goodbye"));
                println!();
                break;
            }
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_http_client_gives_up_on_silent_server() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(5)).await;
        });

        let err = http_client(Duration::from_millis(200))
            .unwrap()
            .post(format!("http://{}/predict/single", addr))
            .json(&serde_json::json!({"age": 63}))
            .send()
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        hold.abort();
    }

    #[test]
    fn test_parse_field_input() {
        let schema = FeatureSchema::heart_disease();
        let age = schema.get("age").unwrap();
        let oldpeak = schema.get("oldpeak").unwrap();

        assert_eq!(parse_field_input(age, " 63 ").unwrap(), Value::from(63));
        assert_eq!(parse_field_input(oldpeak, "2.3").unwrap(), Value::from(2.3));
        assert_eq!(parse_field_input(age, "63.5").unwrap_err(), "enter a whole number");
        assert_eq!(parse_field_input(age, "abc").unwrap_err(), "enter a number");
        assert_eq!(parse_field_input(age, "150").unwrap_err(), "must be between 1 and 120");
    }

    #[test]
    fn test_load_instances_shapes() {
        let dir = tempfile::tempdir().unwrap();

        let bare = dir.path().join("bare.json");
        std::fs::write(&bare, r#"[{"age": 63}, {"age": 40}]"#).unwrap();
        assert_eq!(load_instances(&bare).unwrap().len(), 2);

        let wrapped = dir.path().join("wrapped.json");
        std::fs::write(&wrapped, r#"{"instances": [{"age": 63}]}"#).unwrap();
        assert_eq!(load_instances(&wrapped).unwrap().len(), 1);

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"rows": []}"#).unwrap();
        assert!(load_instances(&bad).is_err());
    }

    #[test]
    fn test_strip_ansi() {
        let colored = "\x1b[1mbold\x1b[0m";
        assert_eq!(strip_ansi(colored), "bold");
    }
}
