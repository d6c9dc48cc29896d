//! `chatloom status`: configuration, storage, and provider overview.

use anyhow::Result;
use console::style;

use chatloom_infra::llm::test_provider_connection;

use crate::state::AppState;

/// Print where data lives and how generation is configured. With
/// `check_provider`, also send a minimal request to the provider.
pub async fn status(state: &AppState, check_provider: bool, json: bool) -> Result<()> {
    let generator = state.sessions.generator();
    let llm = &state.config.llm;
    let capabilities = generator.provider().capabilities();

    let provider_check = if check_provider {
        Some(test_provider_connection(generator.provider()).await)
    } else {
        None
    };

    if json {
        let status = serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "data_dir": state.data_dir.display().to_string(),
            "checkpoint_backend": state.config.checkpoint_backend,
            "default_user_id": state.config.default_user_id,
            "provider": generator.provider().name(),
            "model": llm.model,
            "timeout_secs": generator.settings().timeout.as_secs(),
            "max_context_tokens": capabilities.max_context_tokens,
            "max_output_tokens": capabilities.max_output_tokens,
            "provider_ok": provider_check.as_ref().map(|r| r.is_ok()),
            "provider_error": provider_check
                .as_ref()
                .and_then(|r| r.as_ref().err())
                .map(|e| e.to_string()),
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
        return Ok(());
    }

    println!();
    println!("  {} Chatloom v{}", style("⚡").bold(), env!("CARGO_PKG_VERSION"));
    println!();

    println!("  {}", style("── Storage ──").dim());
    println!("  Data dir:   {}", style(state.data_dir.display()).cyan());
    println!("  Backend:    {:?}", state.config.checkpoint_backend);
    println!("  User:       {}", state.config.default_user_id);
    println!();

    println!("  {}", style("── Generation ──").dim());
    println!("  Provider:   {}", style(generator.provider().name()).cyan());
    println!("  Model:      {}", llm.model);
    println!("  Timeout:    {}s", generator.settings().timeout.as_secs());
    println!("  Context:    {}", token_limit(capabilities.max_context_tokens));
    println!("  Max output: {}", token_limit(capabilities.max_output_tokens));
    println!("  Key var:    {}", llm.api_key_env);

    match provider_check {
        Some(Ok(())) => println!("  Reachable:  {}", style("✓").green()),
        Some(Err(e)) => println!("  Reachable:  {} {}", style("✗").red(), style(e).dim()),
        None => {}
    }
    println!();

    Ok(())
}

fn token_limit(tokens: u32) -> String {
    match tokens {
        0 => "unknown".to_string(),
        n => format!("{n} tokens"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::test_state::test_state;

    #[test]
    fn test_token_limit() {
        assert_eq!(token_limit(0), "unknown");
        assert_eq!(token_limit(128_000), "128000 tokens");
    }

    #[tokio::test]
    async fn test_status_without_provider_check() {
        let state = test_state().await;
        status(&state, false, true).await.unwrap();
        status(&state, false, false).await.unwrap();
    }
}
