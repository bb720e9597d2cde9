//! Opening the editor in the user's browser

/// Local address of the editor for a given port
pub fn editor_url(port: u16) -> String {
    format!("http://localhost:{}", port)
}

/// Try to open `url`; failures are only logged
pub async fn open(url: String) {
    let result = tokio::task::spawn_blocking(move || {
        webbrowser::open(&url).map_err(|e| format!("{}: {}", url, e))
    })
    .await;

    match result {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::debug!("Could not open browser at {}", e),
        Err(e) => tracing::debug!("Browser launch task failed: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_editor_url() {
        assert_eq!(editor_url(8765), "http://localhost:8765");
    }
}
