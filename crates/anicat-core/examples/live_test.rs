use anicat_core::{Catalog, Hydration, SearchParams, Season};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("anicat_core=debug,reqwest=warn")),
        )
        .init();

    let catalog = Catalog::from_env()?;

    println!("🔍 Searching 'cowboy bebop'...\n");

    let page = catalog.search(&SearchParams::text("cowboy bebop").with_limit(5)).await?;

    println!(
        "Page {} of {} results (next page: {}):",
        page.current_page, page.total_count, page.has_next_page
    );
    for (i, entry) in page.items.iter().enumerate() {
        match entry {
            Hydration::Hydrated(anime) => println!(
                "  {}. {} - ID: {} [{}]",
                i + 1,
                anime.anime.attributes.canonical_title.as_deref().unwrap_or("?"),
                anime.id(),
                anime.genre_names().join(", ")
            ),
            Hydration::Failed { anime, error } => {
                println!("  {}. ID {} could not be hydrated: {}", i + 1, anime.id, error)
            }
        }
    }

    if let Some(first) = page.items.first() {
        println!("\n📺 Loading details for ID {}\n", first.id());

        let detail = catalog.details(first.id()).await?;
        let relations = &detail.relations;

        println!(
            "Title: {}",
            detail.anime.attributes.canonical_title.as_deref().unwrap_or("?")
        );
        if let Some(rating) = detail.anime.attributes.average_rating() {
            println!("Average rating: {:.1}", rating);
        }
        println!("Episodes: {}", relations.episodes.len());
        println!("Reviews: {}", relations.reviews.len());
        println!("Characters:");
        for character in relations.characters.iter().take(10) {
            println!(
                "  • {} ({})",
                character.attributes.name.as_deref().unwrap_or("?"),
                character.role
            );
        }
        if !relations.missing_characters.is_empty() {
            println!("  ({} characters could not be loaded)", relations.missing_characters.len());
        }

        let genres = detail.genre_names();
        let related = catalog.related(genres.as_slice(), detail.id()).await?;
        println!("\n🔗 {} related anime", related.len());
    }

    let seasonal = catalog.seasonal(Season::Fall, 2023).await?;
    let failed = seasonal.iter().filter(|entry| !entry.is_hydrated()).count();
    println!("\n🍂 Fall 2023: {} anime ({} failed to hydrate)", seasonal.len(), failed);

    let pick = catalog.random().await?;
    println!(
        "\n🎲 Random pick: {}",
        pick.anime.attributes.canonical_title.as_deref().unwrap_or("?")
    );

    Ok(())
}
