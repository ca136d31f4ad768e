// SPDX-License-Identifier: MIT

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use waymark_core::{linkify, Dataset, Span};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the place dataset (map.json)
    #[arg(short, long, env = "WAYMARK_DATA", default_value = "data/map.json")]
    data: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List all places, optionally restricted to one category
    List {
        #[arg(short, long)]
        category: Option<String>,
    },
    /// List categories with their place counts
    Categories,
    /// Show one place in full
    Show { id: String },
    /// Print the shareable fragment link for a place
    Link { id: String },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let dataset = Dataset::load(&cli.data)?;

    match &cli.command {
        Commands::List { category } => {
            let mut places: Vec<_> = dataset
                .places()
                .filter(|p| category.as_ref().map_or(true, |c| &p.category == c))
                .collect();
            places.sort_by(|a, b| a.name.cmp(&b.name));

            if places.is_empty() {
                if let Some(c) = category {
                    println!("No places in category '{}'", c);
                }
            }
            for place in places {
                let cat = dataset
                    .category(&place.category)
                    .map(|c| c.name.as_str())
                    .unwrap_or(place.category.as_str());
                println!("{:<24} {:<20} #{}", place.name, cat, place.id);
            }
        }
        Commands::Categories => {
            for (id, category) in dataset.categories_sorted() {
                println!("{:<20} {:>4}  ({})", category.name, category.count, id);
            }
        }
        Commands::Show { id } => {
            let place = dataset
                .place(id)
                .ok_or_else(|| anyhow::anyhow!("No place with id '{}'", id))?;
            let (lat, lon) = place.lat_lon();

            println!("{}", place.name);
            println!("Category:    {}", place.category);
            println!("Coordinates: {:.5}, {:.5} (lat, lon)", lat, lon);
            if let Some(description) = &place.description {
                println!("\n{}", description);
                let links: Vec<String> = linkify(description)
                    .into_iter()
                    .filter_map(|span| match span {
                        Span::Link(url) => Some(url),
                        Span::Text(_) => None,
                    })
                    .collect();
                if !links.is_empty() {
                    println!("\nLinks:");
                    for url in links {
                        println!("  {}", url);
                    }
                }
            }
            if !place.img.is_empty() {
                println!("\nImages:");
                for url in &place.img {
                    println!("  {}", url);
                }
            }
        }
        Commands::Link { id } => {
            let place = dataset
                .place(id)
                .ok_or_else(|| anyhow::anyhow!("No place with id '{}'", id))?;
            println!("#{}", place.id);
        }
    }

    Ok(())
}
