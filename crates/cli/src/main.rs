mod client;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use client::{ApiClient, ClientError, ClientFailure, Operation};
use clinica_core::constants::{DEFAULT_API_URL, DEFAULT_PAGE, DEFAULT_PAGE_SIZE};
use clinica_core::schedule::{combine_date_and_slot, exam_time_slot_labels};
use clinica_core::{CreateExam, CreatePatient, Exam, ExamWithPatient, Patient};
use clinica_types::Modality;

#[derive(Parser)]
#[command(name = "clinica")]
#[command(about = "Clinica patient and exam registry CLI")]
struct Cli {
    /// Base URL of the Clinica REST API
    #[arg(long, global = true, env = "CLINICA_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Patient operations
    #[command(subcommand)]
    Patients(PatientCommands),
    /// Exam operations
    #[command(subcommand)]
    Exams(ExamCommands),
    /// CPF utilities (offline)
    #[command(subcommand)]
    Cpf(CpfCommands),
}

#[derive(Subcommand)]
enum PatientCommands {
    /// List patients
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Register a patient
    Create {
        /// Full name
        #[arg(long)]
        name: String,
        /// CPF, masked or digits only
        #[arg(long)]
        document: String,
        /// Date of birth (YYYY-MM-DD)
        #[arg(long)]
        birth_date: String,
    },
}

#[derive(Subcommand)]
enum ExamCommands {
    /// List exams
    List {
        #[arg(long, default_value_t = DEFAULT_PAGE)]
        page: u32,
        #[arg(long, default_value_t = DEFAULT_PAGE_SIZE)]
        page_size: u32,
    },
    /// Register an exam. Re-running with the same --key returns the existing exam.
    Create {
        /// Idempotency key (generated if omitted; reuse it to retry safely)
        #[arg(long)]
        key: Option<String>,
        /// Patient UUID
        #[arg(long)]
        patient_id: String,
        /// Exam date (YYYY-MM-DD)
        #[arg(long)]
        date: NaiveDate,
        /// Exam time, one of the bookable slots (HH:MM, UTC)
        #[arg(long)]
        time: String,
        /// Modality code (CR, CT, DX, MG, MR, NM, OT, PT, RF, US, XA)
        #[arg(long)]
        modality: String,
        /// Free-text description
        #[arg(long)]
        description: Option<String>,
    },
    /// Show bookable exam times
    Slots {
        /// Ask the server instead of using the built-in schedule
        #[arg(long)]
        remote: bool,
    },
}

#[derive(Subcommand)]
enum CpfCommands {
    /// Check whether a CPF is valid
    Check { value: String },
    /// Apply the 000.000.000-00 mask
    Format { value: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("clinica=warn".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let client = ApiClient::new(cli.api_url);

    match cli.command {
        Some(Commands::Patients(cmd)) => run_patients(&client, cmd).await,
        Some(Commands::Exams(cmd)) => run_exams(&client, cmd).await,
        Some(Commands::Cpf(cmd)) => {
            run_cpf(cmd);
            Ok(())
        }
        None => {
            println!("Use --help for usage.");
            Ok(())
        }
    }
}

/// Renders a client error as the message shown to the user.
fn failure(err: ClientError, operation: Operation) -> anyhow::Error {
    tracing::debug!("{:?}", err);
    anyhow::anyhow!(ClientFailure::classify(&err, operation).to_string())
}

async fn run_patients(client: &ApiClient, cmd: PatientCommands) -> anyhow::Result<()> {
    match cmd {
        PatientCommands::List { page, page_size } => {
            let patients = client
                .list_patients(page, page_size)
                .await
                .map_err(|e| failure(e, Operation::ListPatients))?;
            if patients.is_empty() {
                println!("No patients found.");
            }
            for patient in patients {
                print_patient(&patient);
            }
        }
        PatientCommands::Create {
            name,
            document,
            birth_date,
        } => {
            // Same check the server runs; fail before the round trip.
            if !clinica_cpf::is_valid(&document) {
                anyhow::bail!("Invalid CPF: {}", document);
            }
            let req = CreatePatient {
                name,
                document: clinica_cpf::normalize(&document),
                birth_date,
            };
            let patient = client
                .create_patient(&req)
                .await
                .map_err(|e| failure(e, Operation::CreatePatient))?;
            println!("Created patient:");
            print_patient(&patient);
        }
    }
    Ok(())
}

async fn run_exams(client: &ApiClient, cmd: ExamCommands) -> anyhow::Result<()> {
    match cmd {
        ExamCommands::List { page, page_size } => {
            let exams = client
                .list_exams(page, page_size)
                .await
                .map_err(|e| failure(e, Operation::ListExams))?;
            if exams.is_empty() {
                println!("No exams found.");
            }
            for exam in exams {
                print_exam_with_patient(&exam);
            }
        }
        ExamCommands::Create {
            key,
            patient_id,
            date,
            time,
            modality,
            description,
        } => {
            let modality: Modality = modality.parse()?;
            let exam_date = combine_date_and_slot(date, &time)?;
            let key = key.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

            let req = CreateExam {
                idempotency_key: key.clone(),
                patient_id,
                exam_date: exam_date.to_rfc3339(),
                modality: modality.to_string(),
                description,
            };
            let exam = client
                .create_exam(&req)
                .await
                .map_err(|e| failure(e, Operation::CreateExam))?;
            println!("Exam registered (idempotency key: {}):", key);
            print_exam(&exam);
        }
        ExamCommands::Slots { remote } => {
            let slots = if remote {
                client
                    .exam_time_slots()
                    .await
                    .map_err(|e| failure(e, Operation::ListTimeSlots))?
            } else {
                exam_time_slot_labels()
            };
            println!("{}", slots.join(" "));
        }
    }
    Ok(())
}

fn run_cpf(cmd: CpfCommands) {
    match cmd {
        CpfCommands::Check { value } => match clinica_cpf::Cpf::parse(&value) {
            Ok(cpf) => println!("valid: {}", cpf),
            Err(e) => {
                println!("invalid: {}", e);
                if let Some((first, second)) = clinica_cpf::check_digits(&value) {
                    println!("expected check digits: {}{}", first, second);
                }
            }
        },
        CpfCommands::Format { value } => println!("{}", clinica_cpf::format(&value)),
    }
}

fn print_patient(patient: &Patient) {
    println!(
        "ID: {}, Name: {}, CPF: {}, Born: {}",
        patient.id,
        patient.name,
        clinica_cpf::format(&patient.document),
        patient.birth_date
    );
}

fn print_exam(exam: &Exam) {
    println!(
        "ID: {}, Patient: {}, Date: {}, Modality: {}, Description: {}",
        exam.id,
        exam.patient_id,
        exam.exam_date.format("%Y-%m-%d %H:%M"),
        exam.modality,
        exam.description.as_deref().unwrap_or("-")
    );
}

fn print_exam_with_patient(view: &ExamWithPatient) {
    println!(
        "ID: {}, Patient: {} ({}), Date: {}, Modality: {}, Key: {}",
        view.exam.id,
        view.patient.name,
        view.patient.id,
        view.exam.exam_date.format("%Y-%m-%d %H:%M"),
        view.exam.modality,
        view.exam.idempotency_key
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_exams_create_parses_date_and_time() {
        let cli = Cli::try_parse_from([
            "clinica",
            "exams",
            "create",
            "--key",
            "k-1",
            "--patient-id",
            "00000000-0000-0000-0000-000000000000",
            "--date",
            "2024-05-02",
            "--time",
            "08:30",
            "--modality",
            "CT",
        ])
        .expect("arguments should parse");

        match cli.command {
            Some(Commands::Exams(ExamCommands::Create { key, date, time, .. })) => {
                assert_eq!(key.as_deref(), Some("k-1"));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 5, 2).unwrap());
                assert_eq!(time, "08:30");
            }
            _ => panic!("expected exams create"),
        }
    }

    #[test]
    fn test_api_url_flag_overrides_default() {
        let cli = Cli::try_parse_from(["clinica", "--api-url", "http://api:8080", "exams", "slots"])
            .expect("arguments should parse");
        assert_eq!(cli.api_url, "http://api:8080");
    }

    #[test]
    fn test_patients_list_defaults() {
        let cli = Cli::try_parse_from(["clinica", "patients", "list"]).expect("should parse");
        match cli.command {
            Some(Commands::Patients(PatientCommands::List { page, page_size })) => {
                assert_eq!(page, DEFAULT_PAGE);
                assert_eq!(page_size, DEFAULT_PAGE_SIZE);
            }
            _ => panic!("expected patients list"),
        }
    }
}
