/// keep only the final path component; a name that is empty or a dot entry comes back empty
pub fn sanitize_filename(filename: &str) -> String {
    let name = filename.rsplit(|c: char| matches!(c, '/' | '\\')).next().unwrap_or_default();
    match name.trim() {
        "" | "." | ".." => String::new(),
        _ => name.to_string(),
    }
}

const SI_UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
const SIGNIFICANT_DIGITS: i32 = 3;

/// human readable size using decimal (SI) units, e.g. 644950 -> "645 kB", 1500 -> "1.5 kB"
pub fn format_size(bytes: u64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;

    while value >= 1000.0 && unit < SI_UNITS.len() - 1 {
        value /= 1000.0;
        unit += 1;
    }

    // 999_950 rounds up to the next unit
    let mut rounded = round_significant(value);
    if rounded >= 1000.0 && unit < SI_UNITS.len() - 1 {
        rounded = round_significant(rounded / 1000.0);
        unit += 1;
    }

    format!("{} {}", rounded, SI_UNITS[unit])
}

fn round_significant(value: f64) -> f64 {
    if value == 0.0 {
        return 0.0;
    }
    let decimals = SIGNIFICANT_DIGITS - 1 - value.abs().log10().floor() as i32;
    if decimals <= 0 {
        return value.round();
    }
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// resolves on ctrl-c or SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
