//! # medtrack-cli.rs
//!
//! Ein Kommandozeilen-Tool für die vertraulichen Lieferdaten und die Chargen-IDs.
//!
//! ## Befehle:
//! - `generate-keys`: Erzeugt ein neues Carrier-Schlüsselpaar (Base64).
//! - `seal`: Versiegelt Adresse und Telefon für einen Carrier.
//! - `open`: Öffnet einen Umschlag mit dem geheimen Schlüssel des Carriers.
//! - `normalize-id`: Zeigt die normalisierte Form einer Objekt-ID.
//! - `demo`: Spielt den Ablauf Producer → Carrier → Pharmacy gegen einen In-Memory-Ledger durch.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use medtrack_lib::services::order_flows::Confirmation;
use medtrack_lib::{
    open_delivery_envelope, seal_delivery_info, ActiveIdentity, ClientConfig,
    CreateOrderRequest, DeliveryConfirmation, DeliveryInfo, EncodedKeyPair, InMemoryLedger,
    MedTrackService, ObjectId, ResolvedBatch, ShippingUpdate,
};
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Das Haupt-Struct für das CLI-Tool, das von `clap` geparst wird.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Pfad zu einer TOML-Konfigurationsdatei.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Definiert die verfügbaren Unterbefehle.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Erzeugt ein neues X25519-Schlüsselpaar für einen Carrier.
    GenerateKeys,

    /// Versiegelt Lieferadresse und Telefonnummer mit dem öffentlichen Schlüssel des Carriers.
    Seal {
        /// Base64-kodierter öffentlicher Schlüssel des Carriers.
        #[arg(long)]
        public_key: String,
        #[arg(long)]
        address: String,
        #[arg(long)]
        phone: String,
    },

    /// Öffnet einen Umschlag und gibt den JSON-Klartext aus.
    Open {
        /// Base64-kodierter geheimer Schlüssel des Carriers.
        #[arg(long)]
        secret_key: String,
        /// Der Umschlag selbst oder `@<datei>`.
        #[arg(long)]
        envelope: String,
    },

    /// Normalisiert eine Objekt-ID (Präfix entfernen, Kleinschreibung, Länge prüfen).
    NormalizeId { id: String },

    /// Spielt den vollständigen Ablauf gegen einen In-Memory-Ledger durch.
    Demo,
}

/// Hauptfunktion des Programms.
#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ClientConfig::load(path)
            .with_context(|| format!("Could not load configuration from {}", path.display()))?,
        None => ClientConfig::default(),
    };

    match cli.command {
        Commands::GenerateKeys => generate_keys(),
        Commands::Seal {
            public_key,
            address,
            phone,
        } => seal(&public_key, address, phone)?,
        Commands::Open {
            secret_key,
            envelope,
        } => open(&secret_key, &envelope)?,
        Commands::NormalizeId { id } => normalize_id(&id)?,
        Commands::Demo => demo(config).await?,
    }

    Ok(())
}

/// Logik für den `generate-keys`-Befehl.
fn generate_keys() {
    let pair = EncodedKeyPair::generate();
    println!("public_key = {}", pair.public_key);
    println!("secret_key = {}", pair.secret_key);
    eprintln!("Keep the secret key private. Share only the public key with producers.");
}

fn seal(public_key: &str, address: String, phone: String) -> Result<()> {
    let info = DeliveryInfo::new(address, phone);
    let envelope = seal_delivery_info(public_key, &info).context("Sealing failed")?;
    println!("{}", envelope);
    Ok(())
}

fn open(secret_key: &str, envelope: &str) -> Result<()> {
    let text = match envelope.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .with_context(|| format!("Could not read envelope file {}", path))?,
        None => envelope.to_string(),
    };
    let plaintext = open_delivery_envelope(text.trim(), secret_key).context("Opening failed")?;
    println!("{}", plaintext);
    Ok(())
}

fn normalize_id(raw: &str) -> Result<()> {
    let id = ObjectId::parse(raw).with_context(|| format!("'{}' is not a valid object id", raw))?;
    println!("{}", id);
    Ok(())
}

fn print_timeline(resolved: &ResolvedBatch) {
    println!(
        "Batch {} ({}) - {}",
        resolved.batch_id,
        resolved.medicine_code.as_deref().unwrap_or("N/A"),
        resolved.current_status
    );
    let stages = [
        ("created", &resolved.created),
        ("shipping", &resolved.shipping),
        ("delivered", &resolved.delivered),
    ];
    for (label, stage) in stages {
        match stage {
            Some(record) => println!(
                "  {:<10} {}  {}  {}",
                label, record.timestamp, record.location_info, record.note
            ),
            None => println!("  {:<10} pending", label),
        }
    }
    for warning in &resolved.warnings {
        println!("  warning: {}", warning);
    }
}

async fn demo(config: ClientConfig) -> Result<()> {
    let ledger = Arc::new(InMemoryLedger::new(&config));
    let mut service = MedTrackService::new(ledger, config)?;
    let carrier_keys = EncodedKeyPair::generate();

    service.unlock(ActiveIdentity::generate());
    let confirmation = service
        .create_order_and_confirm(&CreateOrderRequest {
            medicine_code: "PhT-2025-12".to_string(),
            producer_name: "DHG Pharma".to_string(),
            receiver_company: "Long Chau Pharmacy".to_string(),
            delivery: DeliveryInfo::new("123 Nguyen Trai Street, District 1", "0987654321"),
            carrier_public_key: carrier_keys.public_key.clone(),
        })
        .await?;
    let batch_id = match confirmation {
        Confirmation::Confirmed {
            created_batch: Some(id),
            ..
        } => id,
        other => anyhow::bail!("Batch creation not confirmed: {:?}", other),
    };
    let batch = batch_id.to_string();
    print_timeline(&service.track_batch(&batch).await?);

    service.unlock(ActiveIdentity::generate());
    let revealed = service
        .reveal_delivery_info(&batch, &carrier_keys.secret_key)
        .await?;
    println!("Carrier decrypted delivery info: {}", revealed);
    let digest = service
        .update_shipping(&ShippingUpdate {
            batch_id: batch.clone(),
            carrier_name: "Viettel Post".to_string(),
            carrier_phone: "+84912345678".to_string(),
            location: "45 Le Loi Street, District 3".to_string(),
        })
        .await?;
    service.await_confirmation(&digest).await?;
    print_timeline(&service.track_batch(&batch).await?);

    service.unlock(ActiveIdentity::generate());
    let digest = service
        .confirm_delivery(&DeliveryConfirmation {
            batch_id: batch.clone(),
            pharmacy_name: "Long Chau Pharmacy".to_string(),
            pharmacy_phone: "0901234567".to_string(),
            receiver_company: Some("long chau pharmacy".to_string()),
        })
        .await?;
    service.await_confirmation(&digest).await?;
    print_timeline(&service.track_batch(&batch).await?);
    Ok(())
}
