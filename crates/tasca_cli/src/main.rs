//! Command-line front end for the tasca directory.
//!
//! # Responsibility
//! - Seed, reset and query a local tasca database from a terminal.
//! - Submit tascas and reviews through the same services the app uses.
//!
//! Errors are reported with `anyhow` context; the core stays typed.

use anyhow::{bail, Context, Result};
use chrono::NaiveDateTime;
use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tasca_core::db::open_db;
use tasca_core::format::{format_distance, format_price_level, format_score};
use tasca_core::{
    default_log_level, format_schedule_range, init_logging, is_open, reset_database,
    search_suggestions, seed_if_empty, todays_schedule, DayKey, GeoPoint, ListingFilters,
    ListingOptions, ListingService, RankedTasca, ReviewDraft, SeedDataset, SeedOutcome,
    SubmissionService, SuggestionQuery, TascaDraft, TascaId,
};

const DEFAULT_DB_FILE: &str = "tascas.sqlite3";
const REFERENCE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Browse and review tascas stored in a local SQLite database.
///
/// Examples:
///   tasca seed
///   tasca list --barato --lat 38.7223 --lng -9.1393
///   tasca list --aberto --at "2024-01-01 13:00"
///   tasca add-review <ID> --nick Ana --comida 4.5 --ambiente 4 --preco-justo 5
#[derive(Parser, Debug)]
#[command(name = "tasca")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// SQLite database file; created and migrated when missing
    #[arg(long, global = true, value_name = "PATH", default_value = DEFAULT_DB_FILE)]
    db: PathBuf,

    /// Write rolling logs to this directory
    #[arg(long, global = true, value_name = "DIR")]
    log_dir: Option<PathBuf>,

    /// Log level (trace|debug|info|warn|error); defaults by build mode
    #[arg(long, global = true, value_name = "LEVEL")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List tascas ranked by score, or by distance when a location is given
    List(ListArgs),
    /// Show one tasca with its hours and reviews
    Show {
        /// Tasca ID
        id: String,
        #[command(flatten)]
        location: LocationArgs,
        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Suggest tasca names containing TEXT
    Search {
        text: String,
        #[arg(long, default_value_t = 10)]
        limit: u32,
    },
    /// Insert the bundled demo dataset when the database is empty
    Seed,
    /// Delete every tasca and review, then insert the bundled dataset
    Reset,
    /// Submit a new tasca
    AddTasca(AddTascaArgs),
    /// Submit a review for an existing tasca
    AddReview(AddReviewArgs),
    /// Print core ping and version
    Info,
}

#[derive(Args, Debug, Default)]
struct LocationArgs {
    /// Latitude of the reference location
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,
    /// Longitude of the reference location
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

impl LocationArgs {
    fn point(&self) -> Option<GeoPoint> {
        match (self.lat, self.lng) {
            (Some(lat), Some(lng)) => Some(GeoPoint::new(lat, lng)),
            _ => None,
        }
    }
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Substring matched against name, city or address
    #[arg(short, long)]
    query: Option<String>,
    /// Only the cheapest price tier
    #[arg(long)]
    barato: bool,
    /// Only places serving a menu of the day
    #[arg(long)]
    menu: bool,
    /// Only places tagged with petiscos
    #[arg(long)]
    petiscos: bool,
    /// Only places tagged as home-style or traditional cooking
    #[arg(long)]
    caseira: bool,
    /// Only places open at the reference time
    #[arg(long)]
    aberto: bool,
    /// Reference time as "YYYY-MM-DD HH:MM" (local); defaults to now
    #[arg(long, value_name = "DATETIME")]
    at: Option<String>,
    #[command(flatten)]
    location: LocationArgs,
    /// Print JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Args, Debug)]
struct AddTascaArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    address: String,
    #[arg(long)]
    city: String,
    #[arg(long, allow_hyphen_values = true)]
    lat: f64,
    #[arg(long, allow_hyphen_values = true)]
    lng: f64,
    /// Price tier 1..=3
    #[arg(long, default_value_t = 2)]
    price: u8,
    #[arg(long)]
    menu_of_day: bool,
    #[arg(long)]
    cards: bool,
    #[arg(long)]
    veg: bool,
    #[arg(long)]
    gluten_free: bool,
    /// Comma-separated tags
    #[arg(long, default_value = "")]
    tags: String,
    #[arg(long)]
    phone: Option<String>,
    #[arg(long)]
    website: Option<String>,
    #[arg(long)]
    menu_url: Option<String>,
    /// Weekly hours, one day per line or `;`-separated: "mon:12:00-15:00;tue:12:00-15:00"
    #[arg(long, default_value = "")]
    schedule: String,
}

#[derive(Args, Debug)]
struct AddReviewArgs {
    /// Tasca ID
    tasca_id: String,
    #[arg(long)]
    nick: String,
    #[arg(long)]
    comida: f64,
    #[arg(long)]
    ambiente: f64,
    #[arg(long)]
    preco_justo: f64,
    #[arg(long, default_value = "")]
    comment: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(log_dir) = &cli.log_dir {
        let level = cli.log_level.as_deref().unwrap_or(default_log_level());
        let absolute = absolute_path(log_dir)?;
        init_logging(level, &absolute.to_string_lossy())
            .map_err(|err| anyhow::anyhow!(err))
            .context("failed to initialize logging")?;
    }

    run(&cli)
}

fn run(cli: &Cli) -> Result<()> {
    match &cli.command {
        Command::Info => {
            println!("tasca_core ping={}", tasca_core::ping());
            println!("tasca_core version={}", tasca_core::core_version());
            Ok(())
        }
        Command::Seed => {
            let conn = open(&cli.db)?;
            let outcome = seed_if_empty(&conn, &SeedDataset::bundled()?)?;
            print_seed_outcome(outcome);
            Ok(())
        }
        Command::Reset => {
            let mut conn = open(&cli.db)?;
            let outcome = reset_database(&mut conn, &SeedDataset::bundled()?)?;
            print_seed_outcome(outcome);
            Ok(())
        }
        Command::List(args) => run_list(&cli.db, args),
        Command::Show { id, location, json } => run_show(&cli.db, id, location, *json),
        Command::Search { text, limit } => {
            let conn = open(&cli.db)?;
            let query = SuggestionQuery {
                text: text.clone(),
                limit: *limit,
            };
            for hit in search_suggestions(&conn, &query)? {
                println!("{}  {}", hit.id, hit.name);
            }
            Ok(())
        }
        Command::AddTasca(args) => {
            let conn = open(&cli.db)?;
            let service = SubmissionService::try_from_connection(&conn)?;
            let tasca = service.add_tasca(tasca_draft(args))?;
            println!("added tasca {} ({})", tasca.id, tasca.name);
            Ok(())
        }
        Command::AddReview(args) => {
            let conn = open(&cli.db)?;
            let service = SubmissionService::try_from_connection(&conn)?;
            let review = service.add_review(ReviewDraft {
                tasca_id: parse_tasca_id(&args.tasca_id)?,
                user_nick: args.nick.clone(),
                comida: args.comida,
                ambiente: args.ambiente,
                preco_justo: args.preco_justo,
                comment: args.comment.clone(),
            })?;
            println!("added review {}", review.id);
            Ok(())
        }
    }
}

fn run_list(db: &Path, args: &ListArgs) -> Result<()> {
    let conn = open(db)?;
    let service = ListingService::try_from_connection(&conn)?;
    let now = match args.at.as_deref() {
        Some(raw) => parse_reference_time(raw)?,
        None => chrono::Local::now().naive_local(),
    };
    let options = list_options(args, now);
    let items = service.list(&options)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&items)?);
        return Ok(());
    }
    if items.is_empty() {
        println!("no tascas found");
        return Ok(());
    }
    for item in &items {
        println!("{}", summary_line(item, now));
    }
    Ok(())
}

fn list_options(args: &ListArgs, now: NaiveDateTime) -> ListingOptions {
    ListingOptions {
        query: args.query.clone(),
        filters: ListingFilters {
            barato: args.barato,
            menu: args.menu,
            petiscos: args.petiscos,
            comida_caseira: args.caseira,
            aberto_agora: args.aberto,
        },
        location: args.location.point(),
        reference_time: Some(now),
    }
}

fn run_show(db: &Path, id: &str, location: &LocationArgs, json: bool) -> Result<()> {
    let conn = open(db)?;
    let service = ListingService::try_from_connection(&conn)?;
    let tasca_id = parse_tasca_id(id)?;
    let Some(detail) = service.get_by_id(tasca_id, location.point())? else {
        bail!("tasca {tasca_id} not found");
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&detail)?);
        return Ok(());
    }

    let now = chrono::Local::now().naive_local();
    let tasca = &detail.ranked.tasca;
    println!("{}", summary_line(&detail.ranked, now));
    println!("  {}, {}", tasca.address, tasca.city);
    if !tasca.tags_csv.is_empty() {
        println!("  tags: {}", tasca.tags().join(", "));
    }
    for (label, value) in [
        ("phone", &tasca.phone),
        ("website", &tasca.website),
        ("menu", &tasca.menu_url),
    ] {
        if let Some(value) = value {
            println!("  {label}: {value}");
        }
    }
    println!("  hours:");
    for day in DayKey::ALL {
        let ranges = tasca.schedule.ranges_for(day);
        let hours = if ranges.is_empty() {
            "closed".to_string()
        } else {
            format_schedule_range(ranges)
        };
        println!("    {day}: {hours}");
    }
    println!(
        "  comida {} / ambiente {} / preço justo {}",
        format_score(detail.ranked.score.comida),
        format_score(detail.ranked.score.ambiente),
        format_score(detail.ranked.score.preco_justo)
    );
    println!("  reviews ({}):", detail.reviews.len());
    for review in &detail.reviews {
        println!(
            "    {} [{} / {} / {}] {}",
            review.user_nick,
            format_score(review.comida),
            format_score(review.ambiente),
            format_score(review.preco_justo),
            review.comment
        );
    }
    Ok(())
}

fn summary_line(item: &RankedTasca, now: NaiveDateTime) -> String {
    let tasca = &item.tasca;
    let mut line = format!(
        "{}  {} ({}) {} score {} ({} reviews)",
        tasca.id,
        tasca.name,
        tasca.city,
        format_price_level(tasca.price_level),
        format_score(item.score.score),
        item.score.reviews_count
    );
    if let Some(distance_km) = item.distance_km {
        line.push_str(&format!(" {}", format_distance(distance_km)));
    }
    if is_open(&tasca.schedule, now) {
        line.push_str(" open");
    } else {
        let today = todays_schedule(&tasca.schedule, now);
        if today.is_empty() {
            line.push_str(" closed today");
        } else {
            line.push_str(&format!(" closed, today {}", format_schedule_range(today)));
        }
    }
    line
}

fn tasca_draft(args: &AddTascaArgs) -> TascaDraft {
    TascaDraft {
        name: args.name.clone(),
        address: args.address.clone(),
        city: args.city.clone(),
        lat: args.lat,
        lng: args.lng,
        price_level: args.price,
        has_menu_of_day: args.menu_of_day,
        accepts_cards: args.cards,
        veg_options: args.veg,
        gluten_free: args.gluten_free,
        tags_csv: args.tags.clone(),
        phone: args.phone.clone(),
        website: args.website.clone(),
        menu_url: args.menu_url.clone(),
        schedule_text: args.schedule.replace(';', "\n"),
    }
}

fn open(db: &Path) -> Result<rusqlite::Connection> {
    open_db(db).with_context(|| format!("failed to open database `{}`", db.display()))
}

fn print_seed_outcome(outcome: SeedOutcome) {
    match outcome {
        SeedOutcome::Seeded { tascas, reviews } => {
            println!("seeded {tascas} tascas and {reviews} reviews");
        }
        SeedOutcome::Skipped { existing } => {
            println!("database already holds {existing} tascas; nothing seeded");
        }
    }
}

fn parse_tasca_id(raw: &str) -> Result<TascaId> {
    TascaId::parse_str(raw.trim()).with_context(|| format!("invalid tasca id `{raw}`"))
}

fn parse_reference_time(raw: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), REFERENCE_TIME_FORMAT)
        .with_context(|| format!("expected \"YYYY-MM-DD HH:MM\", got `{raw}`"))
}

fn absolute_path(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    Ok(std::env::current_dir()
        .context("failed to resolve current directory")?
        .join(path))
}

#[cfg(test)]
mod tests {
    use super::{list_options, parse_reference_time, tasca_draft, Cli, Command};
    use clap::Parser;

    #[test]
    fn list_flags_and_location_parse() {
        let cli = Cli::try_parse_from([
            "tasca", "--db", "/tmp/t.db", "list", "--barato", "--aberto", "--lat", "38.72",
            "--lng", "-9.14",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list command");
        };
        assert!(args.barato && args.aberto);
        assert!(!args.menu);
        let point = args.location.point().unwrap();
        assert_eq!(point.lng, -9.14);
    }

    #[test]
    fn list_options_use_the_given_reference_time() {
        let cli = Cli::try_parse_from([
            "tasca", "list", "--aberto", "--at", "2024-01-01 13:00", "-q", "lisboa",
        ])
        .unwrap();
        let Command::List(args) = cli.command else {
            panic!("expected list command");
        };
        let now = parse_reference_time(args.at.as_deref().unwrap()).unwrap();
        let options = list_options(&args, now);
        assert_eq!(options.reference_time, Some(now));
        assert_eq!(options.query.as_deref(), Some("lisboa"));
        assert!(options.filters.aberto_agora);
        assert!(options.location.is_none());
    }

    #[test]
    fn lat_without_lng_is_rejected() {
        assert!(Cli::try_parse_from(["tasca", "list", "--lat", "38.72"]).is_err());
    }

    #[test]
    fn add_tasca_schedule_accepts_semicolons() {
        let cli = Cli::try_parse_from([
            "tasca",
            "add-tasca",
            "--name",
            "Tasca Nova",
            "--address",
            "Rua Nova 1",
            "--city",
            "Porto",
            "--lat",
            "41.14",
            "--lng",
            "-8.61",
            "--schedule",
            "mon:12:00-15:00;tue:12:00-15:00",
        ])
        .unwrap();
        let Command::AddTasca(args) = cli.command else {
            panic!("expected add-tasca command");
        };
        let draft = tasca_draft(&args);
        assert_eq!(draft.price_level, 2);
        assert_eq!(draft.schedule_text, "mon:12:00-15:00\ntue:12:00-15:00");
    }

    #[test]
    fn reference_time_requires_minutes() {
        assert!(parse_reference_time("2024-01-01 13:00").is_ok());
        assert!(parse_reference_time("2024-01-01").is_err());
    }
}
