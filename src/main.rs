use anyhow::{bail, Context};
use chrono::{Local, NaiveDate, NaiveTime};
use clap::{Parser, Subcommand};
use medizen::config::AppConfig;
use medizen::features::avatar::AVATAR_ITEMS;
use medizen::features::clinic::{Attachment, Intake};
use medizen::features::pharmacy::Cart;
use medizen::features::providers::Referral;
use medizen::features::wellness::{ANSWER_OPTIONS, QUESTIONS};
use medizen::features::Companion;
use medizen::gateway::{AiGateway, LatLng};
use medizen::records::{DailyLog, ProfilePatch};
use medizen::{store, MediZenError};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "medizen", version, about = "Personal health companion")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show or edit the profile
    Profile {
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        character_name: Option<String>,
        #[arg(long)]
        age: Option<u32>,
    },
    /// Log today's vitals
    Checkin {
        #[arg(long, default_value = "120/80")]
        bp: String,
        #[arg(long)]
        sugar: f64,
        #[arg(long)]
        stress: u8,
        #[arg(long)]
        hemoglobin: f64,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Describe symptoms for a diagnosis
    Diagnose {
        symptoms: String,
        #[arg(long)]
        duration: Option<String>,
        #[arg(long)]
        specialty: Option<String>,
        /// Attach a report or photo
        #[arg(long)]
        attach: Option<PathBuf>,
    },
    #[command(subcommand)]
    Report(ReportCommand),
    /// Search the history archive
    Archive {
        #[arg(default_value = "")]
        query: String,
    },
    #[command(subcommand)]
    Pharmacy(PharmacyCommand),
    /// Find clinics for a specialty
    Clinics {
        #[arg(long)]
        specialty: Option<String>,
        /// Medical document to pick the specialty from
        #[arg(long, conflicts_with = "specialty")]
        document: Option<PathBuf>,
        #[arg(long, requires = "lng")]
        lat: Option<f64>,
        #[arg(long, requires = "lat")]
        lng: Option<f64>,
    },
    /// Book an appointment
    Book {
        clinic: String,
        #[arg(long, default_value = "General")]
        specialty: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long)]
        time: NaiveTime,
    },
    /// Take the wellness questionnaire
    Wellness {
        /// 21 comma-separated answers (0-3); asked interactively when absent
        #[arg(long)]
        answers: Option<String>,
    },
    /// Generate a 30-day plan, or show the saved one
    Plan {
        #[arg(long)]
        show: bool,
    },
    /// Forecast from recent check-ins
    Forecast,
    #[command(subcommand)]
    Avatar(AvatarCommand),
    /// Vitals over time
    Metrics {
        /// Pull vitals from the latest report first
        #[arg(long)]
        sync: bool,
    },
    /// Read text or a report aloud
    Speak {
        text: Option<String>,
        #[arg(long, conflicts_with = "text")]
        report: Option<String>,
        /// Save the speech as WAV instead of playing it
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Start a live voice call
    Live,
    /// Ask the support assistant
    Support { message: String },
    /// Export a formal write-up to a text file
    Export {
        #[arg(value_enum)]
        kind: ExportKind,
        id: String,
    },
}

#[derive(Subcommand)]
enum ReportCommand {
    /// Analyze a medical document
    Upload { path: PathBuf },
    /// Write the formal clinical report
    Formal { id: String },
    /// Ask about a report
    Chat { id: String, message: String },
    List,
}

#[derive(Subcommand)]
enum PharmacyCommand {
    Identify {
        name: Option<String>,
        #[arg(long, conflicts_with = "name")]
        image: Option<PathBuf>,
    },
    Suggest { symptoms: String },
    /// Find medicines in a prescription
    Scan { path: PathBuf },
    /// Price a list of medicines
    Cart { names: Vec<String> },
}

#[derive(Subcommand)]
enum AvatarCommand {
    List,
    Buy { id: String },
    Equip { id: String },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum ExportKind {
    Report,
    Wellness,
    Record,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "medizen=debug,info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        match e.downcast_ref::<MediZenError>() {
            Some(err) => {
                eprintln!("{}", err.user_message());
                if err.needs_credential_replacement() {
                    eprintln!("Replace your API key (GEMINI_API_KEY) and try again.");
                }
                tracing::debug!("{}", err);
            }
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;
    let store = store::open(&config.data_dir);
    let gateway = AiGateway::new(&config)?;
    let app = Companion::new(store, gateway).with_export_dir(&config.export_dir);
    info!("Starting MediZen");

    match cli.command {
        Command::Profile {
            name,
            character_name,
            age,
        } => {
            let patch = ProfilePatch {
                name,
                character_name,
                age,
                ..Default::default()
            };
            let profile = if patch.is_empty() {
                app.store().profile()
            } else {
                app.store().update_profile(&patch)?
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        Command::Checkin {
            bp,
            sugar,
            stress,
            hemoglobin,
            notes,
        } => {
            let profile = app.check_in(DailyLog {
                date: Local::now().date_naive(),
                blood_pressure: bp,
                blood_sugar: sugar,
                stress_level: stress,
                hemoglobin,
                notes,
            })?;
            println!(
                "Checked in. {} points, streak {} (best {}).",
                profile.medi_points, profile.streak, profile.max_streak
            );
        }
        Command::Diagnose {
            symptoms,
            duration,
            specialty,
            attach,
        } => {
            let mut intake = Intake::symptoms(symptoms);
            intake.duration = duration;
            intake.specialty_preference = specialty;
            if let Some(path) = attach {
                intake = intake.with_attachment(Attachment::from_path(&path)?);
            }
            let outcome = app.diagnose(intake).await?;
            print_analysis(&outcome.report.id, &outcome.report.analysis);
        }
        Command::Report(cmd) => run_report(&app, cmd).await?,
        Command::Archive { query } => {
            let results = app.search_archive(&query);
            for r in &results.reports {
                println!("report   {}  {}  {} ({})", r.date.date_naive(), r.id, r.filename, r.specialty);
            }
            for a in &results.appointments {
                println!("visit    {} {}  {} ({})", a.date, a.time, a.clinic_name, a.specialty);
            }
            for c in &results.consultations {
                println!("consult  {}  {} ({})", c.date.date_naive(), c.problem, c.specialty);
            }
            for w in &results.assessments {
                println!("wellness {}  {}  score {} ({})", w.date.date_naive(), w.id, w.score, w.category);
            }
            if results.is_empty() {
                println!("Archive empty.");
            }
        }
        Command::Pharmacy(cmd) => run_pharmacy(&app, cmd).await?,
        Command::Clinics {
            specialty,
            document,
            lat,
            lng,
        } => {
            let location = lat.zip(lng).map(|(latitude, longitude)| LatLng {
                latitude,
                longitude,
            });
            let search = match document {
                Some(path) => match app.find_clinics_for_document(&path, location).await? {
                    Referral::Healthy { summary } => {
                        println!("No specialist needed.\n{}", summary);
                        return Ok(());
                    }
                    Referral::Undetermined { summary } => {
                        println!("{}", summary);
                        bail!("could not determine a specialty; pass --specialty instead");
                    }
                    Referral::Clinics {
                        specialty,
                        summary,
                        search,
                    } => {
                        println!("{}\nSpecialty: {}", summary, specialty);
                        search
                    }
                },
                None => app.find_clinics(specialty.as_deref(), location).await?,
            };
            println!("{}", search.text);
            for loc in &search.locations {
                println!("- {}  {}", loc.title, loc.uri);
            }
        }
        Command::Book {
            clinic,
            specialty,
            date,
            time,
        } => {
            let appt = app.book_appointment(&clinic, &specialty, date, time)?;
            println!("Booked {} ({}) on {} at {}", appt.clinic_name, appt.id, appt.date, appt.time);
        }
        Command::Wellness { answers } => {
            let answers = match answers {
                Some(list) => parse_answers(&list)?,
                None => ask_questionnaire()?,
            };
            let (result, analysis) = app.complete_wellness_check(&answers).await?;
            println!("{} ({}), score {}", result.id, result.category, result.score);
            println!("{}", analysis.summary);
            for s in &result.strategies {
                println!("- {}", s);
            }
        }
        Command::Plan { show } => {
            let plan = if show {
                match app.current_plan() {
                    Some(plan) => plan,
                    None => bail!("no plan saved yet"),
                }
            } else {
                app.generate_monthly_plan().await?
            };
            println!("{}", serde_json::to_string_pretty(&plan)?);
        }
        Command::Forecast => {
            let forecast = app.forecast().await?;
            println!("[{:?}] {}", forecast.risk_level, forecast.prediction);
            for action in &forecast.actions {
                println!("- {}", action);
            }
        }
        Command::Avatar(cmd) => match cmd {
            AvatarCommand::List => {
                let profile = app.store().profile();
                for item in AVATAR_ITEMS.iter() {
                    let owned = if profile.has_unlocked(item.id) { "owned" } else { "" };
                    println!("{:<12} {:<16} {:<6} {:>5}  {}", item.id, item.name, item.category, item.cost, owned);
                }
                println!("{} points", profile.medi_points);
            }
            AvatarCommand::Buy { id } => {
                let profile = app.purchase_item(&id)?;
                println!("Unlocked {}. {} points left.", id, profile.medi_points);
            }
            AvatarCommand::Equip { id } => {
                app.equip_item(&id)?;
                println!("Equipped {}.", id);
            }
        },
        Command::Metrics { sync } => {
            if sync {
                app.sync_metrics_from_latest_report().await?;
            }
            let profile = app.store().profile();
            println!(
                "BP {}  sugar {}  stress {}  Hb {}",
                profile.blood_pressure, profile.blood_sugar, profile.stress_level, profile.hemoglobin
            );
            for p in app.metric_series() {
                println!("{}  sugar {:>6.1}  stress {:>2}  Hb {:>5.1}", p.date, p.sugar, p.stress, p.hemoglobin);
            }
        }
        Command::Speak { text, report, save } => {
            let clip = match (text, report) {
                (_, Some(id)) => app.speak_report(&id).await?,
                (Some(text), None) => app.gateway().synthesize_speech(&text).await?,
                (None, None) => bail!("give text or --report"),
            };
            match save {
                Some(path) => {
                    let pcm = medizen::audio::decode(&clip.data)?;
                    medizen::audio::write_pcm16_wav(&path, &pcm, config.output_sample_rate, 1)?;
                    println!("Saved {}", path.display());
                }
                None => play_clip(&clip.data, config.output_sample_rate)?,
            }
        }
        Command::Live => run_live(&config).await?,
        Command::Support { message } => {
            println!("{}", app.gateway().support_reply(&message).await?);
        }
        Command::Export { kind, id } => {
            let path = match kind {
                ExportKind::Report => app.export_formal_report(&id)?,
                ExportKind::Wellness => app.export_wellness_report(&id).await?,
                ExportKind::Record => app.export_record(&id)?,
            };
            println!("Saved {}", path.display());
        }
    }

    Ok(())
}

async fn run_report(app: &Companion, cmd: ReportCommand) -> anyhow::Result<()> {
    match cmd {
        ReportCommand::Upload { path } => {
            let outcome = app.upload_report(&path).await?;
            print_analysis(&outcome.report.id, &outcome.report.analysis);
        }
        ReportCommand::Formal { id } => {
            let report = app.generate_formal_report(&id).await?;
            println!("{}", report.formal_report_text.unwrap_or_default());
        }
        ReportCommand::Chat { id, message } => {
            println!("{}", app.chat_about_report(&id, &message).await?);
        }
        ReportCommand::List => {
            for r in app.store().reports() {
                println!("{}  {}  {} ({})", r.date.date_naive(), r.id, r.filename, r.specialty);
            }
        }
    }
    Ok(())
}

async fn run_pharmacy(app: &Companion, cmd: PharmacyCommand) -> anyhow::Result<()> {
    match cmd {
        PharmacyCommand::Identify { name, image } => {
            let draft = match (name, image) {
                (_, Some(path)) => app.identify_medicine_image(&path).await?,
                (Some(name), None) => app.identify_medicine(&name).await?,
                (None, None) => bail!("give a medicine name or --image"),
            };
            println!("{}", serde_json::to_string_pretty(&draft)?);
        }
        PharmacyCommand::Suggest { symptoms } => {
            for m in app.suggest_medicines(&symptoms).await? {
                println!("- {}: {}", m.name.unwrap_or_default(), m.uses.join(", "));
            }
        }
        PharmacyCommand::Scan { path } => {
            for m in app.scan_prescription(&path).await? {
                println!("- {} ({}) {:.2}", m.name, m.dosage, m.price);
            }
        }
        PharmacyCommand::Cart { names } => {
            let mut cart = Cart::new();
            for name in &names {
                let draft = app.identify_medicine(name).await?;
                cart.add(draft);
            }
            for m in cart.items() {
                println!("- {:<24} {:>8.2}", m.name, m.price);
            }
            println!("{} item(s), total {:.2}", cart.len(), cart.total());
        }
    }
    Ok(())
}

fn print_analysis(id: &str, analysis: &medizen::records::ReportAnalysis) {
    println!("[{}] {}", analysis.specialty_or_general(), id);
    println!("{}", analysis.summary);
    for r in &analysis.recommendations {
        println!("- {}", r);
    }
    if !analysis.medications.is_empty() {
        println!("Medications: {}", analysis.medications.join(", "));
    }
}

fn parse_answers(list: &str) -> anyhow::Result<Vec<u8>> {
    list.split(',')
        .map(|a| {
            a.trim()
                .parse::<u8>()
                .with_context(|| format!("not an answer: {:?}", a))
        })
        .collect()
}

fn ask_questionnaire() -> anyhow::Result<Vec<u8>> {
    let stdin = std::io::stdin();
    let mut lines = stdin.lock().lines();
    let mut answers = Vec::with_capacity(QUESTIONS.len());

    for (i, q) in QUESTIONS.iter().enumerate() {
        println!("\n{}/{} {}: {}", i + 1, QUESTIONS.len(), q.section, q.text);
        for (score, label) in ANSWER_OPTIONS.iter().enumerate() {
            println!("  {} {}", score, label);
        }
        loop {
            print!("> ");
            std::io::stdout().flush()?;
            let line = lines.next().context("questionnaire aborted")??;
            match line.trim().parse::<u8>() {
                Ok(a) if (a as usize) < ANSWER_OPTIONS.len() => {
                    answers.push(a);
                    break;
                }
                _ => println!("Answer 0-3"),
            }
        }
    }
    Ok(answers)
}

#[cfg(feature = "audio-io")]
fn play_clip(data: &str, sample_rate: u32) -> anyhow::Result<()> {
    let mut session = medizen::audio::AudioSession::new(medizen::audio::RodioSink::open()?, sample_rate, 1);
    session.play(data)?;
    session.wait();
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
fn play_clip(_data: &str, _sample_rate: u32) -> anyhow::Result<()> {
    bail!("built without audio output, use --save")
}

#[cfg(feature = "audio-io")]
async fn run_live(config: &AppConfig) -> anyhow::Result<()> {
    medizen::live::call::run_voice_call(config).await?;
    Ok(())
}

#[cfg(not(feature = "audio-io"))]
async fn run_live(_config: &AppConfig) -> anyhow::Result<()> {
    bail!("built without audio devices")
}
