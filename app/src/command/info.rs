use nyxie_config::Config;

/// Strategy for displaying configuration information.
///
/// Prints provider, generation, memory and Telegram settings with secrets
/// masked.
#[derive(Debug, Clone, Copy)]
pub struct InfoStrategy;

impl super::CommandStrategy for InfoStrategy {
    type Input = ();

    async fn execute(&self, _input: Self::Input) -> anyhow::Result<()> {
        let config = Config::load()?;

        println!("=== Nyxie Configuration ===\n");

        let gemini = &config.providers.gemini;
        println!("Gemini:");
        println!("  API Key: {}", mask(&gemini.api_key));
        println!("  Model: {}", gemini.model);
        if let Some(ref base_url) = gemini.base_url {
            println!("  Base URL: {base_url}");
        }
        println!();

        let generation = &config.generation;
        println!("Generation:");
        println!("  Temperature: {}", generation.temperature);
        println!("  Top P: {}", generation.top_p);
        println!("  Top K: {}", generation.top_k);
        println!("  Max Output Tokens: {}", generation.max_output_tokens);
        println!();

        println!("Memory:");
        println!("  Directory: {}", config.memory.dir.display());
        println!("  Max Retained Size: {}", config.memory.max_retained_size);
        println!("  Context Budget: {}", config.memory.context_budget);
        println!();

        println!("Personality: {}", truncate(config.personality(), 60));
        println!();

        println!("Telegram:");
        println!("  Token: {}", mask(&config.telegram.token));

        Ok(())
    }
}

fn mask(secret: &str) -> String {
    if secret.is_empty() {
        "(not set)".to_string()
    } else if secret.len() > 8 && secret.is_ascii() {
        format!("{}...{}", &secret[..4], &secret[secret.len() - 4..])
    } else {
        "***".to_string()
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    let first_line = s.lines().next().unwrap_or_default();
    if first_line.chars().count() <= max_chars {
        first_line.to_string()
    } else {
        let head: String = first_line.chars().take(max_chars - 3).collect();
        format!("{head}...")
    }
}
