use std::path::PathBuf;
use std::sync::Arc;

use billing_core::config::{
    CHARGE_LAG_ERROR_DAYS_ENV, CHARGE_LAG_WARNING_DAYS_ENV, MAX_DIAGNOSES_ENV, RULES_FILE_ENV,
};
use billing_core::modifiers::{parse_input_code, parse_input_diagnosis};
use billing_core::selection::{available_add_ons, required_modifiers};
use billing_core::{
    ChargeContext, ChargeSelection, ComplianceEngine, CoreConfig, ScrubBatch, SelectedCode,
};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "billing")]
#[command(about = "Cardiology billing code compliance CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify procedure codes into their domains
    Classify {
        /// Billed codes (modifiers allowed)
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// List bundling (CCI) edits triggered by a set of codes
    Bundling {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Check whether diagnoses support a procedure code
    Diagnosis {
        /// Procedure code
        code: String,
        /// ICD-10 diagnosis codes
        #[arg(required = true)]
        diagnoses: Vec<String>,
    },
    /// Run the full rule pipeline over one charge
    Evaluate {
        #[arg(required = true)]
        codes: Vec<String>,
        /// ICD-10 diagnosis (repeatable)
        #[arg(long = "dx")]
        diagnoses: Vec<String>,
        /// Documented time in minutes
        #[arg(long)]
        time: Option<u32>,
        /// Date of service (YYYY-MM-DD)
        #[arg(long)]
        charge_date: Option<NaiveDate>,
        /// When the charge was entered (RFC 3339)
        #[arg(long)]
        created_at: Option<DateTime<Utc>>,
        #[arg(long)]
        admit_date: Option<NaiveDate>,
        #[arg(long)]
        discharge_date: Option<NaiveDate>,
        #[arg(long)]
        date_of_birth: Option<NaiveDate>,
        /// Prior authorisation is on file
        #[arg(long)]
        prior_auth: bool,
    },
    /// Replay code clicks from an empty selection
    Select {
        #[arg(required = true)]
        codes: Vec<String>,
    },
    /// Scrub a JSON or YAML batch of stored charges
    Scrub {
        /// Batch file (`.json`, `.yaml` or `.yml`)
        file: PathBuf,
    },
    /// Print the active rule tables as YAML
    Rules,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("billing=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let cfg = CoreConfig::from_env_values(
        std::env::var(RULES_FILE_ENV).ok(),
        std::env::var(CHARGE_LAG_WARNING_DAYS_ENV).ok(),
        std::env::var(CHARGE_LAG_ERROR_DAYS_ENV).ok(),
        std::env::var(MAX_DIAGNOSES_ENV).ok(),
    )?;
    let engine = ComplianceEngine::new(Arc::new(cfg))?;

    match cli.command {
        Some(Commands::Classify { codes }) => {
            for code in codes {
                let billed = parse_input_code(engine.tables(), &code)?;
                println!("{}: {}", billed.code, engine.classify(&billed.code));
            }
        }
        Some(Commands::Bundling { codes }) => {
            let violations = engine.check_bundling(&codes);
            if violations.is_empty() {
                println!("No bundling edits triggered.");
            } else {
                println!("{}", serde_json::to_string_pretty(&violations)?);
            }
        }
        Some(Commands::Diagnosis { code, diagnoses }) => {
            let billed = parse_input_code(engine.tables(), &code)?;
            let diagnoses = diagnoses
                .iter()
                .map(|dx| parse_input_diagnosis(dx))
                .collect::<Result<Vec<_>, _>>()?;
            match engine.validate_diagnosis(&billed.code, &diagnoses) {
                Some(finding) => println!("{}", serde_json::to_string_pretty(&finding)?),
                None => println!("Diagnoses support {}.", billed.code),
            }
        }
        Some(Commands::Evaluate {
            codes,
            diagnoses,
            time,
            charge_date,
            created_at,
            admit_date,
            discharge_date,
            date_of_birth,
            prior_auth,
        }) => {
            let selection = charge_selection(&engine, &codes, &diagnoses, time)?;
            let context = ChargeContext {
                charge_date,
                created_at,
                admit_date,
                discharge_date,
                date_of_birth,
                prior_auth_documented: prior_auth,
            };
            let result = engine.evaluate(&selection, &context);
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        Some(Commands::Select { codes }) => {
            let selection = engine.replay(&codes);
            let output = serde_json::json!({
                "codes": selection.code_list(),
                "required_modifiers": required_modifiers(engine.tables(), &selection),
                "available_add_ons": available_add_ons(engine.tables(), &selection),
            });
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        Some(Commands::Scrub { file }) => {
            let batch = ScrubBatch::load(&file)?;
            let report = engine.scrub(&batch.charges, &batch.patients);
            println!("{}", serde_json::to_string_pretty(&report)?);
            if !report.summary.may_submit {
                eprintln!(
                    "{} of {} charge(s) carry errors; batch may not be submitted.",
                    report.summary.with_errors, report.summary.total
                );
                std::process::exit(1);
            }
        }
        Some(Commands::Rules) => {
            print!("{}", engine.tables().render()?);
        }
        None => {
            println!("Use 'billing --help' for commands");
        }
    }

    Ok(())
}

fn charge_selection(
    engine: &ComplianceEngine,
    codes: &[String],
    diagnoses: &[String],
    time: Option<u32>,
) -> Result<ChargeSelection, Box<dyn std::error::Error>> {
    let mut selected = Vec::with_capacity(codes.len());
    for code in codes {
        parse_input_code(engine.tables(), code)?;
        selected.push(SelectedCode::new(code.trim()));
    }
    let diagnoses = diagnoses
        .iter()
        .map(|dx| parse_input_diagnosis(dx))
        .collect::<Result<Vec<_>, _>>()?;

    let selection = ChargeSelection::from_codes(selected).with_time_minutes(time);
    Ok(engine.attach_diagnoses(&selection, &diagnoses)?)
}
