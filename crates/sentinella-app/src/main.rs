// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Sentinella — operator CLI for the trust layer.
//
// Entry point. Initialises logging and configuration, then dispatches to the
// field-encryption, token, plausibility and review commands.

mod commands;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sentinella_core::TrustConfig;

/// sentinella - PII vault, QR capability tokens, and check-in plausibility
#[derive(Parser, Debug)]
#[command(name = "sentinella")]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    // === PII vault ===
    /// Encrypt a value into the `<iv>:<tag>:<ciphertext>` column format
    Encrypt {
        value: String,
        /// Also print the search hash
        #[arg(long)]
        with_hash: bool,
        /// Audit database to record the encryption in
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Decrypt a column value (legacy plaintext is printed unchanged)
    Decrypt {
        value: String,
        /// Show only the last N characters
        #[arg(long)]
        mask: Option<usize>,
        /// Audit database to record decryption failures in
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Search hash of a value (case and surrounding whitespace ignored)
    Hash { value: String },

    // === Capability tokens ===
    /// Issue a stall check-in token
    Issue {
        #[arg(long)]
        vendor: u64,
        #[arg(long)]
        stall: u64,
        #[arg(long)]
        market: u64,
        /// Lifetime in seconds (defaults to SENTINELLA_TOKEN_TTL_SECS or 300)
        #[arg(long)]
        ttl: Option<u64>,
        /// Audit database to record the issued token in
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// Validate a `<token>.<signature>` QR string
    Validate {
        qr: String,
        /// Audit database to record rejections in
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    // === Geo ===
    /// Great-circle distance in metres
    Distance {
        #[arg(allow_negative_numbers = true)]
        lat1: f64,
        #[arg(allow_negative_numbers = true)]
        lon1: f64,
        #[arg(allow_negative_numbers = true)]
        lat2: f64,
        #[arg(allow_negative_numbers = true)]
        lon2: f64,
    },

    /// Score a position report against the entity's last known position
    Checkin {
        /// Position database (SQLite)
        #[arg(long)]
        db: PathBuf,
        #[arg(long)]
        entity: String,
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lon: f64,
        /// Observation time (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<String>,
        /// Audit database to queue flagged check-ins in
        #[arg(long)]
        audit: Option<PathBuf>,
    },

    /// List flagged check-ins awaiting manual review, newest first
    Review {
        /// Audit database holding the queue
        #[arg(long)]
        audit: PathBuf,
        #[arg(long, default_value_t = 50)]
        limit: u32,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = TrustConfig::from_env();
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Commands::Encrypt {
            value,
            with_hash,
            audit,
        } => commands::vault::encrypt(&config, &value, with_hash, audit.as_deref()),
        Commands::Decrypt { value, mask, audit } => {
            commands::vault::decrypt(&config, &value, mask, audit.as_deref())
        }
        Commands::Hash { value } => commands::vault::hash(&value),
        Commands::Issue {
            vendor,
            stall,
            market,
            ttl,
            audit,
        } => commands::token::issue(&config, vendor, stall, market, ttl, audit.as_deref()),
        Commands::Validate { qr, audit } => commands::token::validate(&config, &qr, audit.as_deref()),
        Commands::Distance {
            lat1,
            lon1,
            lat2,
            lon2,
        } => commands::geo::distance(lat1, lon1, lat2, lon2),
        Commands::Checkin {
            db,
            entity,
            lat,
            lon,
            at,
            audit,
        } => commands::geo::checkin(
            &config,
            &db,
            &entity,
            lat,
            lon,
            at.as_deref(),
            audit.as_deref(),
        ),
        Commands::Review { audit, limit } => commands::review::list(&audit, limit),
    }
}
