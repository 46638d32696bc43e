//! snowflake-spatial CLI - Snowflake spatial SQL translation and geometry conversion.

use clap::{Parser, Subcommand};
use snowflake_spatial::codec::{decode_binary_with_srid, decode_text_with_srid, encode_binary_with_srid};
use snowflake_spatial::{
    encode_text, DialectConfig, Envelope, FilterToSql, Geometry, PredicateNode, SpatialError,
};
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::{debug, info, Level};

type Result<T> = std::result::Result<T, SpatialError>;

#[derive(Parser)]
#[command(name = "snowflake-spatial")]
#[command(about = "Snowflake spatial filter translation and WKB/WKT conversion")]
#[command(version)]
struct Cli {
    /// Path to dialect YAML configuration file (defaults apply when omitted)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Output JSON result to stdout
    #[arg(long)]
    output_json: bool,

    /// Log format: text or json
    #[arg(long, default_value = "text")]
    log_format: String,

    /// Log verbosity: debug, info, warn, error
    #[arg(long, default_value = "warn")]
    verbosity: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate a JSON filter file into a SQL fragment
    Translate {
        /// Path to the JSON-encoded predicate tree
        #[arg(short, long)]
        filter: PathBuf,

        /// Prefix the fragment with WHERE
        #[arg(long = "where")]
        with_where: bool,

        /// Split a top-level AND into a SQL pre-filter and a JSON post-filter
        #[arg(long, conflicts_with = "with_where")]
        split: bool,
    },

    /// Decode hex-encoded WKB and print WKT
    WkbToWkt {
        /// WKB bytes as hex (EWKB SRID headers are printed as SRID=n;)
        hex: String,
    },

    /// Decode WKT (or EWKT) and print hex-encoded WKB
    WktToWkb {
        /// Geometry text, e.g. "POINT(1 2)" or "SRID=4326;POINT(1 2)"
        wkt: String,
    },

    /// Print the bounding box of a geometry given as hex WKB or WKT
    Envelope {
        /// Hex WKB or WKT text
        geometry: String,
    },

    /// List the predicate kinds the configured dialect can translate
    Capabilities,
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}", e.format_detailed());
            ExitCode::from(e.exit_code())
        }
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    setup_logging(&cli.verbosity, &cli.log_format).map_err(SpatialError::Config)?;

    let config = match cli.config {
        Some(ref path) => {
            let config = DialectConfig::load(path)?;
            info!("Loaded configuration from {:?}", path);
            config
        }
        None => DialectConfig::default(),
    };

    match cli.command {
        Commands::Translate {
            filter,
            with_where,
            split,
        } => translate(&config, &filter, with_where, split, cli.output_json),

        Commands::WkbToWkt { hex } => {
            let bytes = decode_hex(&hex)?;
            let (geometry, srid) = decode_binary_with_srid(&bytes)?;
            let text = encode_text(&geometry)?;
            match srid {
                Some(srid) => println!("SRID={};{}", srid, text),
                None => println!("{}", text),
            }
            Ok(())
        }

        Commands::WktToWkb { wkt } => {
            let (geometry, srid) = decode_text_with_srid(&wkt)?;
            let bytes = encode_binary_with_srid(&geometry, srid)?;
            println!("{}", hex::encode_upper(bytes));
            Ok(())
        }

        Commands::Envelope { geometry } => {
            let geometry = parse_geometry(&geometry)?;
            print_envelope(geometry.envelope(), cli.output_json)
        }

        Commands::Capabilities => {
            let caps = config.capabilities()?;
            let names: Vec<&str> = caps.iter().map(|k| k.name()).collect();
            if cli.output_json {
                println!("{}", serde_json::to_string_pretty(&names)?);
            } else {
                for name in names {
                    println!("{}", name);
                }
            }
            Ok(())
        }
    }
}

fn translate(
    config: &DialectConfig,
    path: &Path,
    with_where: bool,
    split: bool,
    output_json: bool,
) -> Result<()> {
    let content = std::fs::read_to_string(path)?;
    let filter: PredicateNode = serde_json::from_str(&content)?;
    debug!("Read {} filter from {:?}", filter.kind(), path);

    let dialect = config.dialect()?;
    let caps = config.capabilities()?;
    let mut encoder = FilterToSql::new(&dialect, &caps);

    if split {
        let (pre, post) = caps.split(&filter);
        let pre_sql = match pre {
            Some(ref node) => Some(encoder.encode_to_string(node)?),
            None => None,
        };
        if output_json {
            let out = serde_json::json!({ "pre_filter": pre_sql, "post_filter": post });
            println!("{}", serde_json::to_string_pretty(&out)?);
        } else {
            println!("pre-filter:  {}", pre_sql.as_deref().unwrap_or("(none)"));
            match post {
                Some(node) => println!("post-filter: {}", serde_json::to_string(&node)?),
                None => println!("post-filter: (none)"),
            }
        }
        return Ok(());
    }

    let sql = if with_where {
        encoder.encode_where(&filter)?
    } else {
        encoder.encode_to_string(&filter)?
    };
    if output_json {
        println!("{}", serde_json::to_string_pretty(&serde_json::json!({ "sql": sql }))?);
    } else {
        println!("{}", sql);
    }
    Ok(())
}

/// Hex WKB (optionally `0x` or `\x` prefixed) if the input is valid hex,
/// otherwise WKT.
fn parse_geometry(input: &str) -> Result<Geometry> {
    let digits = strip_hex_prefix(input);
    let looks_hex = !digits.is_empty() && digits.chars().all(|c| c.is_ascii_hexdigit());
    if looks_hex {
        let bytes = decode_hex(digits)?;
        Ok(decode_binary_with_srid(&bytes)?.0)
    } else {
        Ok(decode_text_with_srid(input.trim())?.0)
    }
}

fn strip_hex_prefix(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("\\x"))
        .unwrap_or(trimmed)
}

fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let digits = strip_hex_prefix(input);
    hex::decode(digits).map_err(|e| match e {
        hex::FromHexError::InvalidHexCharacter { c, index } => {
            SpatialError::malformed(index, format!("invalid hex character {:?}", c))
        }
        other => SpatialError::malformed(digits.len(), other.to_string()),
    })
}

fn print_envelope(envelope: Option<Envelope>, output_json: bool) -> Result<()> {
    match (envelope, output_json) {
        (Some(env), true) => println!("{}", serde_json::to_string_pretty(&env)?),
        (Some(env), false) => println!(
            "BOX({} {}, {} {})",
            env.min_x, env.min_y, env.max_x, env.max_y
        ),
        (None, true) => println!("null"),
        (None, false) => println!("EMPTY"),
    }
    Ok(())
}

fn setup_logging(verbosity: &str, format: &str) -> std::result::Result<(), String> {
    let level = match verbosity.to_lowercase().as_str() {
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => return Err(format!("unknown verbosity '{}'", other)),
    };

    // stdout carries command output; logs go to stderr
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false);

    match format {
        "json" => subscriber.json().init(),
        "text" => subscriber.init(),
        other => return Err(format!("unknown log format '{}'", other)),
    }

    Ok(())
}
