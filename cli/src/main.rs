//! `whatthedog`: command-line host for the dog service client.

use std::env;

use anyhow::{bail, Context, Result};
use dog_core::format::{format_breed_name, format_confidence, truncate_text};
use dog_core::validation::{
    parse_age, validate_age, validate_breed, validate_description, validate_dog_name,
    validate_search_query,
};
use dog_core::{ApiConfig, DogDetails, DogId, DogRecord, DogService, OperationResult, SearchMode};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const USAGE: &str = "\
usage: whatthedog <command> [args]

commands:
  health                               check that the backend is reachable
  search <query> [--id]                search by name (default) or id
  search-image <path> [--mime <type>]  search with a photo
  upload --name <n> --breed <b> [--age <a>] [--description <d>] <path>...
  list                                 list every dog
  get <id>                             show one dog";

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dog_core=info,whatthedog=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = ApiConfig::from_env().context("loading client configuration")?;
    tracing::info!(base_url = %config.base_url, "using backend");
    let service = DogService::new(config);

    let args: Vec<String> = env::args().skip(1).collect();
    let Some((command, rest)) = args.split_first() else {
        println!("{USAGE}");
        return Ok(());
    };

    match command.as_str() {
        "health" => {
            if service.test_connection() {
                println!("backend reachable");
            } else {
                bail!("backend unreachable");
            }
        }
        "search" => {
            let mode = if has_flag(rest, "--id") {
                SearchMode::Id
            } else {
                SearchMode::Name
            };
            let query = positional(rest, &["--id"]).join(" ");
            validate_search_query(&query)?;
            print_dogs(service.search_by_text(&query, mode))?;
        }
        "search-image" => {
            let mime = flag_value(rest, "--mime");
            let paths = positional(rest, &["--mime"]);
            let Some(path) = paths.first() else {
                bail!("search-image needs a path\n\n{USAGE}");
            };
            print_dogs(service.search_by_image(path, mime.as_deref()))?;
        }
        "upload" => {
            let name = flag_value(rest, "--name").unwrap_or_default();
            let breed = flag_value(rest, "--breed").unwrap_or_default();
            let age = flag_value(rest, "--age").unwrap_or_default();
            let description = flag_value(rest, "--description").unwrap_or_default();
            validate_dog_name(&name)?;
            validate_breed(&breed)?;
            validate_age(&age)?;
            validate_description(&description)?;

            let paths = positional(rest, &["--name", "--breed", "--age", "--description"]);
            let details = DogDetails {
                name: name.trim().to_string(),
                breed: breed.trim().to_string(),
                age: parse_age(&age).and_then(|years| u32::try_from(years).ok()),
                description: Some(description.trim().to_string()).filter(|d| !d.is_empty()),
            };
            match service.upload_photos(&paths, &details) {
                OperationResult::Success(receipt) => println!("{}", receipt.message),
                OperationResult::Failure { message } => bail!(message),
            }
        }
        "list" => print_dogs(service.list_all_dogs())?,
        "get" => {
            let Some(id) = rest.first() else {
                bail!("get needs an id\n\n{USAGE}");
            };
            match service.get_dog(&DogId::new(id.as_str())) {
                OperationResult::Success(dog) => print_dog(&dog, true),
                OperationResult::Failure { message } => bail!(message),
            }
        }
        other => bail!("unknown command {other:?}\n\n{USAGE}"),
    }

    Ok(())
}

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|arg| arg == flag)
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|arg| arg == flag)
        .and_then(|index| args.get(index + 1))
        .cloned()
}

/// Arguments that are neither one of `flags` nor the value following a
/// value-taking flag. `--id` is the only flag without a value.
fn positional<'a>(args: &'a [String], flags: &[&str]) -> Vec<&'a str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if flags.contains(&arg.as_str()) {
            if arg != "--id" {
                iter.next();
            }
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn print_dogs(outcome: OperationResult<Vec<DogRecord>>) -> Result<()> {
    match outcome {
        OperationResult::Success(dogs) if dogs.is_empty() => {
            println!("No dogs found matching your search");
        }
        OperationResult::Success(dogs) => {
            println!("{} result(s)", dogs.len());
            for dog in &dogs {
                print_dog(dog, false);
            }
        }
        OperationResult::Failure { message } => bail!(message),
    }
    Ok(())
}

fn print_dog(dog: &DogRecord, detailed: bool) {
    let mut line = format!("#{} {} ({})", dog.id, dog.name, format_breed_name(&dog.breed));
    if let Some(age) = dog.age {
        line.push_str(&format!(", {age} years"));
    }
    if let Some(confidence) = dog.confidence {
        line.push_str(&format!(", match {}", format_confidence(confidence)));
    }
    println!("{line}");

    if let Some(description) = dog.description.as_deref().filter(|d| !d.is_empty()) {
        let shown = if detailed {
            description.to_string()
        } else {
            truncate_text(description, 60)
        };
        println!("    {shown}");
    }
    if detailed {
        for image in dog.display_images() {
            println!("    {}", image.display_uri());
        }
    }
}
