use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use color_eyre::eyre::{Context, Result, eyre};
use owo_colors::OwoColorize;

use chirp_core::{UserNotice, encode_picture};
use chirp_db::ChirpDb;
use chirp_radio::RadioLink;
use chirp_worker::{AppLifecycle, ChirpWorker, Contact, Message, WorkerEvent, display_name};

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::builder()
                .from_env_lossy()
                .add_directive("chirp_cli=info".parse().unwrap())
                .add_directive("chirp_worker=info".parse().unwrap())
                .add_directive("chirp_radio=info".parse().unwrap())
                .add_directive("chirp_db=info".parse().unwrap()),
        )
        .init();

    let db = ChirpDb::open().await.wrap_err("failed to open the database")?;
    let radio = RadioLink::new(modem_command());
    let mut worker = ChirpWorker::new(db, radio);

    let lifecycle = Arc::new(AppLifecycle::new(Arc::new(ConsoleNotice)));

    let mut event_rx = worker
        .take_event_receiver()
        .ok_or_else(|| eyre!("event receiver already taken"))?;

    if let Err(e) = worker.start().await {
        tracing::warn!("modem unavailable, running storage-only: {e}");
    }

    tokio::spawn(async move {
        while let Some(event) = event_rx.recv().await {
            handle_event(event);
        }
    });

    loop {
        print_menu();
        let choice = read_line("Choice: ")?;

        match choice.trim() {
            "1" => list_contacts(&worker).await?,
            "2" => show_contact(&worker).await?,
            "3" => add_contact(&worker).await?,
            "4" => edit_contact(&worker).await?,
            "5" => delete_contact(&worker).await?,
            "6" => show_conversation(&worker).await?,
            "7" => send_sms(&worker).await?,
            "8" => attach_picture(&worker).await?,
            "9" => watch(&worker, &lifecycle).await?,
            "0" => {
                println!("👋 Shutting down...");
                worker.stop().await?;
                break;
            }
            _ => println!("❌ Invalid choice"),
        }
    }

    Ok(())
}

fn print_menu() {
    println!();
    println!("╔════════════════════════════════════╗");
    println!("║           CHIRP - SMS              ║");
    println!("╠════════════════════════════════════╣");
    println!("║  1. List Contacts                  ║");
    println!("║  2. Show Contact                   ║");
    println!("║  3. Add Contact                    ║");
    println!("║  4. Edit Contact                   ║");
    println!("║  5. Delete Contact                 ║");
    println!("║  6. Show Conversation              ║");
    println!("║  7. Send SMS                       ║");
    println!("║  8. Attach Picture                 ║");
    println!("║  9. Watch for Messages             ║");
    println!("║  0. Exit                           ║");
    println!("╚════════════════════════════════════╝");
}

fn handle_event(event: WorkerEvent) {
    match event {
        WorkerEvent::SmsReceived { contact_id } => {
            println!("\n📨 New message for contact #{contact_id}");
        }
        WorkerEvent::UnknownSmsReceived => {
            println!("\n👤 New contact created from an unknown sender");
        }
    }
}

struct ConsoleNotice;

impl UserNotice for ConsoleNotice {
    fn notify(&self, text: &str) {
        println!("\n🔔 {}", text.yellow());
    }
}

fn modem_command() -> PathBuf {
    std::env::var_os("CHIRP_MODEM")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("chirp-modemd"))
}

async fn list_contacts(worker: &ChirpWorker) -> Result<()> {
    let contacts = worker.contacts().await?;
    if contacts.is_empty() {
        println!("📭 No contacts yet");
        return Ok(());
    }
    println!("📇 {} contact(s):", contacts.len());
    for contact in contacts {
        println!("  #{} {} ({})", contact.id, display_name(&contact), contact.tel_number);
    }
    Ok(())
}

async fn show_contact(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    let Some(contact) = worker.contact(id).await? else {
        println!("❌ No contact #{id}");
        return Ok(());
    };

    println!("👤 {}", display_name(&contact));
    println!("  number:  {}", contact.tel_number);
    if !contact.email.is_empty() {
        println!("  email:   {}", contact.email);
    }
    if !contact.address.is_empty() {
        println!("  address: {}", contact.address);
    }
    if !contact.picture.is_empty() {
        println!("  picture: {} base64 chars", contact.picture.len());
    }
    Ok(())
}

async fn add_contact(worker: &ChirpWorker) -> Result<()> {
    let firstname = read_line("First name: ")?;
    let lastname = read_line("Last name: ")?;
    let tel_number = read_line("Number: ")?;

    if firstname.is_empty() && lastname.is_empty() && tel_number.is_empty() {
        println!("❌ A contact needs at least a name or a number");
        return Ok(());
    }

    let email = read_line("Email (optional): ")?;
    let address = read_line("Address (optional): ")?;

    let id = worker
        .add_contact(&Contact {
            id: 0,
            firstname,
            lastname,
            email,
            address,
            tel_number,
            picture: String::new(),
        })
        .await?;
    println!("✅ Contact #{id} created");
    Ok(())
}

async fn edit_contact(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    let Some(current) = worker.contact(id).await? else {
        println!("❌ No contact #{id}");
        return Ok(());
    };

    println!("Press Enter to keep the current value.");
    let updated = Contact {
        id,
        firstname: read_or_keep("First name", &current.firstname)?,
        lastname: read_or_keep("Last name", &current.lastname)?,
        email: read_or_keep("Email", &current.email)?,
        address: read_or_keep("Address", &current.address)?,
        tel_number: read_or_keep("Number", &current.tel_number)?,
        picture: current.picture,
    };
    worker.update_contact(&updated).await?;
    println!("✅ Contact #{id} updated");
    Ok(())
}

async fn delete_contact(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    worker.delete_contact(id).await?;
    println!("🗑️  Contact #{id} deleted");
    Ok(())
}

async fn show_conversation(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    let Some(contact) = worker.contact(id).await? else {
        println!("❌ No contact #{id}");
        return Ok(());
    };

    let thread = worker.conversation(id).await?;
    if thread.is_empty() {
        println!("💬 No messages with {}", display_name(&contact));
        return Ok(());
    }

    println!("💬 {} message(s) with {}:", thread.len(), display_name(&contact));
    for message in thread {
        print_message(&message);
    }
    Ok(())
}

fn print_message(message: &Message) {
    let when = chrono::DateTime::from_timestamp_millis(message.date)
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default();
    if message.is_sent {
        println!("  {} {} {}", when, "→".green(), message.body);
    } else {
        println!("  {} {} {}", when, "←".cyan(), message.body);
    }
}

async fn send_sms(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    let text = read_line("Message: ")?;
    if text.is_empty() {
        println!("❌ Nothing to send");
        return Ok(());
    }

    match worker.send_sms(id, &text).await {
        Ok(_) => println!("✅ Message stored and handed to the radio"),
        Err(e) => println!("❌ {e}"),
    }
    Ok(())
}

async fn attach_picture(worker: &ChirpWorker) -> Result<()> {
    let Some(id) = read_id()? else {
        return Ok(());
    };
    let Some(mut contact) = worker.contact(id).await? else {
        println!("❌ No contact #{id}");
        return Ok(());
    };

    let path = read_line("Image file: ")?;
    let bytes = match std::fs::read(&path) {
        Ok(bytes) => bytes,
        Err(e) => {
            println!("❌ Could not read {path}: {e}");
            return Ok(());
        }
    };

    match encode_picture(&bytes) {
        Ok(encoded) => {
            contact.picture = encoded;
            worker.update_contact(&contact).await?;
            println!("✅ Picture attached to {}", display_name(&contact));
        }
        Err(e) => println!("❌ Could not encode the picture: {e}"),
    }
    Ok(())
}

async fn watch(worker: &ChirpWorker, lifecycle: &AppLifecycle) -> Result<()> {
    lifecycle.on_background();
    println!("👀 Watching for messages, press Enter to return");
    read_line("")?;
    lifecycle.on_foreground();

    // Deliveries may have changed the contact list while we were away.
    if lifecycle.was_in_background() {
        list_contacts(worker).await?;
    }
    Ok(())
}

fn read_id() -> Result<Option<i64>> {
    let raw = read_line("Contact id: ")?;
    match raw.parse::<i64>() {
        Ok(id) => Ok(Some(id)),
        Err(_) => {
            println!("❌ Not a contact id: {raw}");
            Ok(None)
        }
    }
}

fn read_or_keep(label: &str, current: &str) -> Result<String> {
    let input = read_line(&format!("{label} [{current}]: "))?;
    if input.is_empty() {
        Ok(current.to_string())
    } else {
        Ok(input)
    }
}

fn read_line(prompt: &str) -> Result<String> {
    print!("{prompt}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
