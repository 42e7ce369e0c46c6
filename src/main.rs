use std::io::Write;
use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use imus_core::{
    AppointmentBook, AppointmentKind, ClientConfig, IdCard, ImusClient, NewAppointment,
    PatientQuery, RegistrationForm, ViewState,
};

/// Line-oriented prompt over stdin.
struct Prompt {
    lines: Lines<BufReader<Stdin>>,
}

impl Prompt {
    fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
        }
    }

    /// Returns `None` once stdin is closed.
    async fn ask(&mut self, label: &str) -> anyhow::Result<Option<String>> {
        print!("{label}: ");
        std::io::stdout().flush()?;
        Ok(self.lines.next_line().await?.map(|line| line.trim().to_owned()))
    }

    async fn ask_optional(&mut self, label: &str) -> anyhow::Result<Option<Option<String>>> {
        Ok(self
            .ask(&format!("{label} (optional)"))
            .await?
            .map(|value| Some(value).filter(|v| !v.is_empty())))
    }
}

/// Interactive kiosk for the Ospital ng Imus patient lookup
///
/// Walks the user through the search form, its result states and the appointment view,
/// and offers patient registration.
///
/// # Environment Variables
/// - `IMUS_BACKEND_URL`: hospital backend (default: "http://127.0.0.1:5000")
/// - `IMUS_SESSION_FILE`: admin session file (default: ".imus/admin_session.json")
/// - `IMUS_SESSION_TTL_MINUTES`: admin session lifetime (default: 30)
/// - `IMUS_REFERENCE_DIRECTORY`: YAML file replacing the built-in reference directory
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("imus_run=info".parse()?)
                .add_directive("imus_core=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ClientConfig::from_env_values(
        std::env::var("IMUS_BACKEND_URL").ok(),
        std::env::var("IMUS_SESSION_FILE").ok(),
        std::env::var("IMUS_SESSION_TTL_MINUTES").ok(),
        std::env::var("IMUS_REFERENCE_DIRECTORY").ok(),
    )?;
    tracing::info!("++ Starting Imus kiosk against {}", config.backend_url());
    let client = ImusClient::from_config(config)?;

    let mut prompt = Prompt::new();
    loop {
        println!();
        println!("OSPITAL NG IMUS");
        println!("  1) Search patient record");
        println!("  2) Register new patient");
        println!("  q) Quit");
        let Some(choice) = prompt.ask("Choose").await? else {
            break;
        };
        match choice.as_str() {
            "1" => {
                if !search_screen(&client, &mut prompt).await? {
                    break;
                }
            }
            "2" => {
                if !registration_screen(&client, &mut prompt).await? {
                    break;
                }
            }
            "q" | "Q" => break,
            _ => println!("Please choose 1, 2 or q."),
        }
    }

    Ok(())
}

/// Runs the lookup flow until the user goes back. Returns `false` when stdin closed.
async fn search_screen(client: &ImusClient, prompt: &mut Prompt) -> anyhow::Result<bool> {
    let mut session = client.lookup_session();

    loop {
        match session.state().clone() {
            ViewState::Searching => {
                let Some(query) = read_query(prompt).await? else {
                    return Ok(false);
                };
                if let Err(e) = session.submit(&query).await {
                    println!("{}", e.user_message());
                }
            }
            ViewState::NotFound => {
                println!("No patient record found. Please check the details and try again.");
                let Some(choice) = prompt.ask("[r] Try again  [b] Back").await? else {
                    return Ok(false);
                };
                if choice.eq_ignore_ascii_case("b") {
                    return Ok(true);
                }
                session.dismiss();
            }
            ViewState::Found(patient) => {
                println!();
                print!("{}", IdCard(&patient));
                let Some(choice) = prompt
                    .ask("[a] Appointments  [n] New search  [b] Back")
                    .await?
                else {
                    return Ok(false);
                };
                match choice.to_ascii_lowercase().as_str() {
                    "a" => {
                        let patient = session.request_appointments()?;
                        match client.appointment_book(patient).await {
                            Ok(mut book) => {
                                if !appointment_screen(&mut book, prompt).await? {
                                    return Ok(false);
                                }
                            }
                            Err(e) => println!("{}", e.user_message()),
                        }
                    }
                    "b" => return Ok(true),
                    _ => session.dismiss(),
                }
            }
            ViewState::SelectBirthday(choice) => {
                println!("Several patients share this name. Select the correct birthday:");
                let birthdays = choice.birthdays();
                for (index, birthday) in birthdays.iter().enumerate() {
                    println!("  {}) {}", index + 1, birthday);
                }
                let Some(answer) = prompt.ask("Birthday number, or [c] Cancel").await? else {
                    return Ok(false);
                };
                if answer.eq_ignore_ascii_case("c") {
                    session.dismiss();
                    continue;
                }
                let picked = answer
                    .parse::<usize>()
                    .ok()
                    .and_then(|n| n.checked_sub(1))
                    .and_then(|i| birthdays.get(i).copied());
                match picked {
                    Some(birthday) => {
                        if let Err(e) = session.choose_birthday(birthday) {
                            println!("{}", e.user_message());
                        }
                    }
                    None => println!("Please pick one of the listed numbers."),
                }
            }
        }
    }
}

async fn read_query(prompt: &mut Prompt) -> anyhow::Result<Option<PatientQuery>> {
    println!();
    println!("Patient search");
    let mut values = Vec::with_capacity(6);
    for label in [
        "Last name",
        "First name",
        "Middle name",
        "Birth day (1-31)",
        "Birth month (e.g. March)",
        "Birth year (YYYY)",
    ] {
        let Some(value) = prompt.ask(label).await? else {
            return Ok(None);
        };
        values.push(value);
    }
    let Some(suffix) = prompt.ask_optional("Suffix").await? else {
        return Ok(None);
    };

    let mut values = values.into_iter();
    let mut next = || values.next().unwrap_or_default();
    Ok(Some(PatientQuery {
        lastname: next(),
        firstname: next(),
        middlename: next(),
        day: next(),
        month: next(),
        year: next(),
        suffix,
    }))
}

async fn appointment_screen(book: &mut AppointmentBook, prompt: &mut Prompt) -> anyhow::Result<bool> {
    loop {
        println!();
        println!(
            "Appointments for {} (ID {})",
            book.patient().full_name(),
            book.patient().id
        );
        if book.appointments().is_empty() {
            println!("  No appointments yet.");
        }
        for a in book.appointments() {
            println!(
                "  {} [{}] {} ({})",
                a.date,
                a.kind,
                a.detail,
                a.status.as_deref().unwrap_or("scheduled")
            );
        }

        let Some(choice) = prompt.ask("[n] New appointment  [b] Back").await? else {
            return Ok(false);
        };
        if !choice.eq_ignore_ascii_case("n") {
            return Ok(true);
        }

        let Some(date) = prompt.ask("Date (YYYY-MM-DD)").await? else {
            return Ok(false);
        };
        let labels: Vec<&str> = AppointmentKind::ALL.iter().map(|k| k.label()).collect();
        let Some(kind) = prompt.ask(&format!("Type [{}]", labels.join(", "))).await? else {
            return Ok(false);
        };
        let Some(reason) = prompt.ask_optional("Reason").await? else {
            return Ok(false);
        };

        let kind = if kind.is_empty() {
            Ok(AppointmentKind::default())
        } else {
            kind.parse::<AppointmentKind>()
        };
        let appointment = match kind.and_then(|kind| {
            NewAppointment::new(&date, kind, reason.as_deref().unwrap_or(""))
        }) {
            Ok(appointment) => appointment,
            Err(e) => {
                println!("{e}");
                continue;
            }
        };

        match book.book(&appointment).await {
            Ok(_) => println!("Appointment added."),
            Err(e) => println!("{}", e.user_message()),
        }
    }
}

async fn registration_screen(client: &ImusClient, prompt: &mut Prompt) -> anyhow::Result<bool> {
    println!();
    println!("New patient registration");

    macro_rules! required {
        ($label:expr) => {
            match prompt.ask($label).await? {
                Some(value) => value,
                None => return Ok(false),
            }
        };
    }
    macro_rules! optional {
        ($label:expr) => {
            match prompt.ask_optional($label).await? {
                Some(value) => value,
                None => return Ok(false),
            }
        };
    }

    let form = RegistrationForm {
        lastname: required!("Last name"),
        firstname: required!("First name"),
        middlename: optional!("Middle name"),
        suffix: optional!("Suffix"),
        birthday: required!("Birthday (YYYY-MM-DD)"),
        address: required!("Address"),
        phone: optional!("Phone"),
        email: optional!("Email"),
        emergency_contact_name: optional!("Emergency contact name"),
        emergency_contact_phone: optional!("Emergency contact phone"),
        medical_history: optional!("Medical history"),
        allergies: optional!("Allergies"),
        blood_type: optional!("Blood type"),
    };

    match client.register(&form).await {
        Ok(registered) => match registered.patient_id {
            Some(id) => println!("{} Patient ID: {}", registered.message, id),
            None => println!("{}", registered.message),
        },
        Err(e) => println!("{}", e.user_message()),
    }
    Ok(true)
}
