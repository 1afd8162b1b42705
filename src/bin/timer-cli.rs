use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

#[derive(Parser)]
#[command(name = "timer-cli")]
#[command(about = "Command line client for the level-time REST server", long_about = None)]
struct Cli {
    #[arg(short, long, env = "LEVEL_TIME_URL", default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start a timer in a group
    Start {
        group: String,
        title: String,
        #[arg(long)]
        hourly_price: Option<f64>,
        /// Extra fields as key=value (values parsed as JSON when possible)
        #[arg(short, long = "set")]
        fields: Vec<String>,
    },
    /// Stop a running timer
    Stop { group: String, id: String },
    /// Show a single timer
    Get { group: String, id: String },
    /// Update fields of a timer
    Update {
        group: String,
        id: String,
        #[arg(short, long = "set", required = true)]
        fields: Vec<String>,
    },
    /// List timers, optionally in one group
    List {
        group: Option<String>,
        #[arg(long)]
        title: Option<String>,
    },
    /// List running timers, optionally in one group
    Running { group: Option<String> },
    /// Sum durations and prices
    Consolidate {
        group: Option<String>,
        #[arg(long)]
        since: Option<String>,
        #[arg(long)]
        until: Option<String>,
    },
    /// Remove one timer, one group's timers, or every timer
    Remove {
        group: Option<String>,
        id: Option<String>,
        #[arg(long)]
        all: bool,
    },
    /// List groups
    Groups {
        #[arg(long)]
        names: bool,
    },
    /// Manage one group
    Group {
        #[command(subcommand)]
        command: GroupCommands,
    },
}

#[derive(Subcommand)]
enum GroupCommands {
    Create {
        name: String,
        #[arg(short, long = "set")]
        fields: Vec<String>,
    },
    Show { name: String },
    Update {
        name: String,
        #[arg(short, long = "set", required = true)]
        fields: Vec<String>,
    },
    /// Remove a group and its timers
    Delete { name: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = reqwest::Url::parse(&cli.url)?;
    let url = |segments: &[&str]| endpoint(&base, segments);

    let request = match cli.command {
        Commands::Start {
            group,
            title,
            hourly_price,
            fields,
        } => {
            let mut body = parse_fields(&fields)?;
            body.insert("title".into(), Value::String(title));
            if let Some(price) = hourly_price {
                body.insert("hourlyPrice".into(), price.into());
            }
            client
                .post(url(&["timers", &group, "start"])?)
                .json(&body)
        }
        Commands::Stop { group, id } => client.post(url(&["timers", &group, &id, "stop"])?),
        Commands::Get { group, id } => client.get(url(&["timers", &group, &id])?),
        Commands::Update { group, id, fields } => client
            .put(url(&["timers", &group, &id])?)
            .json(&parse_fields(&fields)?),
        Commands::List { group, title } => {
            let mut request = client.get(url(&timers_path(group.as_deref(), None))?);
            if let Some(title) = title {
                request = request.query(&[("title", title)]);
            }
            request
        }
        Commands::Running { group } => client.get(url(&timers_path(group.as_deref(), Some("running")))?),
        Commands::Consolidate { group, since, until } => {
            let mut query = Vec::new();
            if let Some(since) = since {
                query.push(("since", since));
            }
            if let Some(until) = until {
                query.push(("until", until));
            }
            client
                .get(url(&timers_path(group.as_deref(), Some("consolidate")))?)
                .query(&query)
        }
        Commands::Remove { group, id, all } => match (group, id) {
            (Some(group), Some(id)) => client.delete(url(&["timers", &group, &id])?),
            (Some(group), None) => client.delete(url(&["timers", &group])?),
            (None, _) if all => client.delete(url(&["timers"])?),
            (None, _) => return Err("refusing to remove every timer without --all".into()),
        },
        Commands::Groups { names: true } => client.get(url(&["groups", "names"])?),
        Commands::Groups { names: false } => client.get(url(&["groups"])?),
        Commands::Group { command } => match command {
            GroupCommands::Create { name, fields } => client
                .post(url(&["groups", &name])?)
                .json(&parse_fields(&fields)?),
            GroupCommands::Show { name } => client.get(url(&["groups", &name])?),
            GroupCommands::Update { name, fields } => client
                .put(url(&["groups", &name])?)
                .json(&parse_fields(&fields)?),
            GroupCommands::Delete { name } => client.delete(url(&["groups", &name])?),
        },
    };

    print_response(request.send().await?).await
}

fn timers_path<'a>(group: Option<&'a str>, suffix: Option<&'a str>) -> Vec<&'a str> {
    std::iter::once("timers").chain(group).chain(suffix).collect()
}

/// `base` with `segments` appended, each percent-encoded as a single path segment.
fn endpoint(base: &reqwest::Url, segments: &[&str]) -> Result<reqwest::Url, Box<dyn std::error::Error>> {
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|_| format!("{} cannot be a base URL", base))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// `key=value` pairs into a JSON object. Values that parse as JSON keep their type.
fn parse_fields(pairs: &[String]) -> Result<Map<String, Value>, Box<dyn std::error::Error>> {
    let mut fields = Map::new();
    for pair in pairs {
        let (key, raw) = pair
            .split_once('=')
            .ok_or_else(|| format!("expected key=value, got {:?}", pair))?;
        let value = serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()));
        fields.insert(key.to_string(), value);
    }
    Ok(fields)
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        std::process::exit(1);
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn segments_are_percent_encoded() {
        let base = reqwest::Url::parse("http://localhost:8080").unwrap();
        let url = endpoint(&base, &["timers", "client work", "start"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/timers/client%20work/start");

        let url = endpoint(&base, &["groups", "a/b"]).unwrap();
        assert_eq!(url.as_str(), "http://localhost:8080/groups/a%2Fb");
    }

    #[test]
    fn timers_path_shapes() {
        assert_eq!(timers_path(None, None), vec!["timers"]);
        assert_eq!(timers_path(Some("foo"), Some("running")), vec!["timers", "foo", "running"]);
    }
}
