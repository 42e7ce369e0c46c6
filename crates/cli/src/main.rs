use chrono::{Local, Utc};
use clap::{Args, Parser, Subcommand};
use imus_core::{
    AppointmentKind, ClientConfig, IdCard, ImusClient, ImusResult, LookupSession,
    NewAppointment, Patient, PatientId, PatientQuery, RegistrationForm, ViewState,
};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "imus")]
#[command(about = "Ospital ng Imus patient lookup and booking CLI")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Search form fields.
#[derive(Args, Clone)]
struct SearchArgs {
    #[arg(long)]
    lastname: String,
    #[arg(long, default_value = "")]
    firstname: String,
    #[arg(long, default_value = "")]
    middlename: String,
    #[arg(long)]
    suffix: Option<String>,
    /// Birth day (1-31)
    #[arg(long)]
    day: String,
    /// Birth month name, e.g. March
    #[arg(long)]
    month: String,
    /// Birth year (YYYY)
    #[arg(long)]
    year: String,
    /// Birthday (YYYY-MM-DD) to pick when several patients share the name
    #[arg(long)]
    choose_birthday: Option<String>,
}

impl SearchArgs {
    fn to_query(&self) -> PatientQuery {
        PatientQuery {
            lastname: self.lastname.clone(),
            firstname: self.firstname.clone(),
            middlename: self.middlename.clone(),
            suffix: self.suffix.clone(),
            day: self.day.clone(),
            month: self.month.clone(),
            year: self.year.clone(),
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Search for a patient and show their ID card
    Search(SearchArgs),
    /// Register a new patient
    Register {
        #[arg(long)]
        lastname: String,
        #[arg(long)]
        firstname: String,
        #[arg(long)]
        middlename: Option<String>,
        #[arg(long)]
        suffix: Option<String>,
        /// Birthday (YYYY-MM-DD)
        #[arg(long)]
        birthday: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        emergency_contact_name: Option<String>,
        #[arg(long)]
        emergency_contact_phone: Option<String>,
        #[arg(long)]
        medical_history: Option<String>,
        #[arg(long)]
        allergies: Option<String>,
        #[arg(long)]
        blood_type: Option<String>,
    },
    /// Appointments of a patient found by search
    Appointments {
        #[command(subcommand)]
        command: AppointmentCommands,
    },
    /// Admin area
    Admin {
        #[command(subcommand)]
        command: AdminCommands,
    },
    /// Print the reference directory used when the backend cannot answer
    Directory,
}

#[derive(Subcommand)]
enum AppointmentCommands {
    /// List appointments
    List(SearchArgs),
    /// Book an appointment
    Add {
        #[command(flatten)]
        search: SearchArgs,
        /// Appointment date (YYYY-MM-DD)
        #[arg(long)]
        date: String,
        /// Consultation, Laboratory, Follow-up, Imaging, Admission, Vaccination, Surgery or Other
        #[arg(long = "type", default_value = "Consultation")]
        kind: String,
        #[arg(long, default_value = "")]
        reason: String,
    },
}

#[derive(Subcommand)]
enum AdminCommands {
    /// Log in and store an admin session
    Login {
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },
    /// Remove the stored admin session
    Logout,
    /// Show the stored admin session
    Status,
    /// List patients
    Patients {
        /// Filter on name or address
        #[arg(long)]
        filter: Option<String>,
    },
    /// Show patient and appointment totals
    Summary,
    /// List appointments
    Appointments {
        /// Filter on patient name, type or reason
        #[arg(long)]
        filter: Option<String>,
        /// Only the appointments of this patient
        #[arg(long, conflicts_with = "filter")]
        patient_id: Option<PatientId>,
    },
    /// Upload a .csv or .json file of patients
    Import { file: PathBuf },
    /// Show previous imports
    Imports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("imus_core=warn".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'imus --help' for commands");
        return Ok(());
    };

    let config = ClientConfig::from_env_values(
        std::env::var("IMUS_BACKEND_URL").ok(),
        std::env::var("IMUS_SESSION_FILE").ok(),
        std::env::var("IMUS_SESSION_TTL_MINUTES").ok(),
        std::env::var("IMUS_REFERENCE_DIRECTORY").ok(),
    )?;
    let client = ImusClient::from_config(config)?;

    if let Err(e) = run(&client, command).await {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
    Ok(())
}

async fn run(client: &ImusClient, command: Commands) -> ImusResult<()> {
    match command {
        Commands::Search(args) => {
            let mut session = client.lookup_session();
            resolve(&mut session, &args).await?;
            print_state(session.state());
        }
        Commands::Register {
            lastname,
            firstname,
            middlename,
            suffix,
            birthday,
            address,
            phone,
            email,
            emergency_contact_name,
            emergency_contact_phone,
            medical_history,
            allergies,
            blood_type,
        } => {
            let form = RegistrationForm {
                lastname,
                firstname,
                middlename,
                suffix,
                birthday,
                address,
                phone,
                email,
                emergency_contact_name,
                emergency_contact_phone,
                medical_history,
                allergies,
                blood_type,
            };
            let registered = client.register(&form).await?;
            match registered.patient_id {
                Some(id) => println!("{} (patient ID {})", registered.message, id),
                None => println!("{}", registered.message),
            }
        }
        Commands::Appointments { command } => match command {
            AppointmentCommands::List(args) => {
                let patient = found_patient(client, &args).await?;
                let book = client.appointment_book(patient).await?;
                print_appointments(book.patient(), book.appointments());
            }
            AppointmentCommands::Add {
                search,
                date,
                kind,
                reason,
            } => {
                let kind: AppointmentKind = kind.parse()?;
                let appointment = NewAppointment::new(&date, kind, &reason)?;
                let patient = found_patient(client, &search).await?;
                let mut book = client.appointment_book(patient).await?;
                match book.book(&appointment).await? {
                    Some(id) => println!("Appointment {} booked.", id),
                    None => println!("Appointment booked."),
                }
                print_appointments(book.patient(), book.appointments());
            }
        },
        Commands::Admin { command } => run_admin(client, command).await?,
        Commands::Directory => {
            for patient in client.directory().patients() {
                println!(
                    "ID: {}, Name: {}, Birthday: {}",
                    patient.id,
                    patient.full_name(),
                    patient.birthday
                );
            }
        }
    }
    Ok(())
}

async fn resolve(session: &mut LookupSession, args: &SearchArgs) -> ImusResult<()> {
    session.submit(&args.to_query()).await?;
    let selecting = matches!(session.state(), ViewState::SelectBirthday(_));
    if let (true, Some(birthday)) = (selecting, args.choose_birthday.as_deref()) {
        session.choose_birthday(birthday)?;
    }
    Ok(())
}

async fn found_patient(client: &ImusClient, args: &SearchArgs) -> ImusResult<Patient> {
    let mut session = client.lookup_session();
    resolve(&mut session, args).await?;
    if !matches!(session.state(), ViewState::Found(_)) {
        print_state(session.state());
    }
    session.request_appointments()
}

fn print_state(state: &ViewState) {
    match state {
        ViewState::Searching => println!("Enter patient details to search."),
        ViewState::NotFound => {
            println!("No patient record found. Please check the details and try again.")
        }
        ViewState::Found(patient) => print!("{}", IdCard(patient)),
        ViewState::SelectBirthday(choice) => {
            println!("Several patients match. Re-run with --choose-birthday set to one of:");
            for birthday in choice.birthdays() {
                println!("  {birthday}");
            }
        }
    }
}

fn print_appointments(patient: &Patient, appointments: &[imus_core::Appointment]) {
    println!("Appointments for {} (ID {}):", patient.full_name(), patient.id);
    if appointments.is_empty() {
        println!("  No appointments found.");
    }
    for a in appointments {
        println!(
            "  #{} {} [{}] {} ({})",
            a.id,
            a.date,
            a.kind,
            a.detail,
            a.status.as_deref().unwrap_or("scheduled")
        );
    }
}

async fn run_admin(client: &ImusClient, command: AdminCommands) -> ImusResult<()> {
    let admin = client.admin();
    let now = Utc::now();

    match command {
        AdminCommands::Login { username, password } => {
            let session = admin.login(&username, &password, now).await?;
            println!(
                "Logged in as {}. Session valid until {}.",
                session.username, session.expires_at
            );
        }
        AdminCommands::Logout => {
            if admin.logout()? {
                println!("Logged out.");
            } else {
                println!("No admin session.");
            }
        }
        AdminCommands::Status => match admin.current_session(now)? {
            Some(session) => println!(
                "Logged in as {} (session {}, expires {}).",
                session.username, session.session_id, session.expires_at
            ),
            None => println!("Not logged in."),
        },
        AdminCommands::Patients { filter } => {
            let dashboard = admin.dashboard(now).await?;
            let patients = dashboard.filter_patients(filter.as_deref().unwrap_or(""));
            println!("{} patient(s)", patients.len());
            for p in patients {
                println!(
                    "ID: {}, Name: {}, Birthday: {}, Address: {}",
                    p.id,
                    p.full_name(),
                    p.birthday,
                    p.address.as_deref().unwrap_or("N/A")
                );
            }
        }
        AdminCommands::Summary => {
            let summary = admin.dashboard(now).await?.summary(Local::now().date_naive());
            println!("Total patients: {}", summary.total_patients);
            println!("Total appointments: {}", summary.total_appointments);
            println!("Upcoming appointments: {}", summary.upcoming_appointments);
        }
        AdminCommands::Appointments { filter, patient_id } => {
            let dashboard = admin.dashboard(now).await?;
            let appointments = match patient_id {
                Some(id) => dashboard.appointments_for(id),
                None => dashboard.filter_appointments(filter.as_deref().unwrap_or("")),
            };
            println!("{} appointment(s)", appointments.len());
            for a in appointments {
                println!(
                    "#{} {} {} [{}] {}",
                    a.id,
                    a.date,
                    a.patient_name.as_deref().unwrap_or("N/A"),
                    a.kind,
                    a.detail
                );
            }
        }
        AdminCommands::Import { file } => {
            let report = admin.import_file(&file, now).await?;
            println!("{}", report.message);
            println!(
                "Imported: {}, errors: {}",
                report.imported_count, report.total_errors
            );
            for error in &report.errors {
                println!("  {error}");
            }
        }
        AdminCommands::Imports => {
            let imports = admin.import_history(now).await?;
            if imports.is_empty() {
                println!("No imports yet.");
            }
            for import in imports {
                println!(
                    "#{} {} {} ({} records, {}, {})",
                    import.id,
                    import.import_date,
                    import.filename,
                    import.records_imported,
                    import.import_type,
                    import.status
                );
            }
        }
    }
    Ok(())
}
