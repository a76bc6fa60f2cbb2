use clap::{App, Arg, SubCommand};
use crier::{BroadcastChannel, CrierError, RegionConfig, Result};
use std::{
    path::PathBuf,
    thread,
    time::{Duration, Instant},
};

fn main() -> Result<()> {
    env_logger::init();

    let matches = App::new("crier-cli")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Crier shared memory broadcast CLI tool")
        .subcommand(
            SubCommand::with_name("create")
                .about("Create a broadcast ring region")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Name of the ring")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("capacity")
                        .short("c")
                        .long("capacity")
                        .value_name("BYTES")
                        .help("Ring capacity in bytes, a power of 2 (default 65536)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Backing file path (default /dev/shm/crier_<name>)")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("transmit")
                .about("Transmit messages into an existing ring")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Name of the ring")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Backing file path (default /dev/shm/crier_<name>)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("type")
                        .short("t")
                        .long("type")
                        .value_name("TYPE_ID")
                        .help("Message type id, 1 or above (default 1)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("count")
                        .long("count")
                        .value_name("COUNT")
                        .help("Number of messages to send")
                        .default_value("10")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("payload_size")
                        .short("s")
                        .long("payload-size")
                        .value_name("BYTES")
                        .help("Size of generated payloads")
                        .default_value("64")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("message")
                        .short("m")
                        .long("message")
                        .value_name("TEXT")
                        .help("Send this text instead of generated payloads")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("interval_ms")
                        .long("interval-ms")
                        .value_name("MILLIS")
                        .help("Pause between messages")
                        .default_value("0")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("listen")
                .about("Receive messages from a ring")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Name of the ring")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Backing file path (default /dev/shm/crier_<name>)")
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("count")
                        .short("c")
                        .long("count")
                        .value_name("COUNT")
                        .help("Stop after this many messages (0 = run until interrupted)")
                        .default_value("0")
                        .takes_value(true),
                ),
        )
        .subcommand(
            SubCommand::with_name("info")
                .about("Show the state of a ring")
                .arg(
                    Arg::with_name("name")
                        .short("n")
                        .long("name")
                        .value_name("NAME")
                        .help("Name of the ring")
                        .required(true)
                        .takes_value(true),
                )
                .arg(
                    Arg::with_name("file")
                        .short("f")
                        .long("file")
                        .value_name("FILE")
                        .help("Backing file path (default /dev/shm/crier_<name>)")
                        .takes_value(true),
                ),
        )
        .get_matches();

    match matches.subcommand() {
        ("create", Some(create_matches)) => handle_create(create_matches),
        ("transmit", Some(transmit_matches)) => handle_transmit(transmit_matches),
        ("listen", Some(listen_matches)) => handle_listen(listen_matches),
        ("info", Some(info_matches)) => handle_info(info_matches),
        _ => {
            println!("Use --help for usage information");
            Ok(())
        }
    }
}

/// Configuration for attaching to an existing ring by name or path
fn attach_config(matches: &clap::ArgMatches) -> RegionConfig {
    let name = matches.value_of("name").unwrap();
    let mut config = RegionConfig::new(name, 0).with_create(false);
    if let Some(path) = matches.value_of("file") {
        config = config.with_file_path(PathBuf::from(path));
    }
    config
}

fn handle_create(matches: &clap::ArgMatches) -> Result<()> {
    let name = matches.value_of("name").unwrap();
    let capacity: usize = match matches.value_of("capacity") {
        Some(text) => text
            .parse()
            .map_err(|_| CrierError::invalid_parameter("capacity", "Invalid capacity"))?,
        None => crier::config::DEFAULT_RING_CAPACITY,
    };

    let total_size = BroadcastChannel::total_size_for_capacity(capacity);
    let mut config = RegionConfig::new(name, total_size);
    if let Some(path) = matches.value_of("file") {
        config = config.with_file_path(PathBuf::from(path));
    }
    let path = config.resolved_file_path();

    let channel = BroadcastChannel::create(config)?;

    println!("Created ring '{}' at {}", channel.name(), path.display());
    println!("  Capacity: {} bytes", channel.capacity());
    println!("  Max payload: {} bytes", channel.max_payload_length());
    println!("  Region size: {} bytes", channel.region().size());
    Ok(())
}

fn handle_transmit(matches: &clap::ArgMatches) -> Result<()> {
    let type_id: i32 = match matches.value_of("type") {
        Some(text) => text
            .parse()
            .map_err(|_| CrierError::invalid_parameter("type", "Invalid type id"))?,
        None => crier::config::DEFAULT_TYPE_ID,
    };
    let count: usize = matches
        .value_of("count")
        .unwrap()
        .parse()
        .map_err(|_| CrierError::invalid_parameter("count", "Invalid count"))?;
    let payload_size: usize = matches
        .value_of("payload_size")
        .unwrap()
        .parse()
        .map_err(|_| CrierError::invalid_parameter("payload_size", "Invalid payload size"))?;
    let interval_ms: u64 = matches
        .value_of("interval_ms")
        .unwrap()
        .parse()
        .map_err(|_| CrierError::invalid_parameter("interval_ms", "Invalid interval"))?;
    let message = matches.value_of("message");

    let channel = BroadcastChannel::open(attach_config(matches))?;
    let mut transmitter = channel.transmitter()?;

    println!(
        "Transmitting {} messages of type {} to '{}'",
        count,
        type_id,
        channel.name()
    );

    let start = Instant::now();
    let mut bytes_sent = 0usize;

    for sequence in 0..count {
        let payload: Vec<u8> = match message {
            Some(text) => text.as_bytes().to_vec(),
            None => generated_payload(sequence, payload_size),
        };
        transmitter.transmit(type_id, &payload)?;
        bytes_sent += payload.len();

        if interval_ms > 0 {
            thread::sleep(Duration::from_millis(interval_ms));
        }
    }

    let elapsed = start.elapsed();

    println!("\nResults:");
    println!("  Messages sent: {}", count);
    println!("  Bytes sent: {}", bytes_sent);
    println!("  Total time: {:.2}ms", elapsed.as_secs_f64() * 1000.0);
    if count > 0 && elapsed.as_secs_f64() > 0.0 {
        println!(
            "  Messages/sec: {:.0}",
            count as f64 / elapsed.as_secs_f64()
        );
    }
    println!("  Final tail position: {}", transmitter.tail_position());
    Ok(())
}

fn handle_listen(matches: &clap::ArgMatches) -> Result<()> {
    let limit: usize = matches
        .value_of("count")
        .unwrap()
        .parse()
        .map_err(|_| CrierError::invalid_parameter("count", "Invalid count"))?;

    let channel = BroadcastChannel::open(attach_config(matches))?;
    let mut receiver = channel.copy_receiver()?;

    println!(
        "Listening on '{}' ({} byte capacity)",
        channel.name(),
        channel.capacity()
    );

    let mut delivered = 0usize;
    let mut overruns = 0usize;
    let mut laps = 0u64;

    loop {
        match receiver.receive(|type_id, bytes| {
            println!(
                "[{}] type {} ({} bytes): {}",
                delivered,
                type_id,
                bytes.len(),
                preview(bytes)
            );
        }) {
            Ok(true) => delivered += 1,
            Ok(false) => thread::sleep(Duration::from_millis(1)),
            Err(CrierError::Overrun { .. }) => overruns += 1,
            Err(e) => return Err(e),
        }

        if receiver.lap_count() > laps {
            laps = receiver.lap_count();
            println!("  (lapped: stream jumped ahead, {} laps total)", laps);
        }

        if limit > 0 && delivered >= limit {
            break;
        }
    }

    println!("\nResults:");
    println!("  Messages received: {}", delivered);
    println!("  Overruns: {}", overruns);
    println!("  Laps: {}", receiver.lap_count());
    Ok(())
}

fn handle_info(matches: &clap::ArgMatches) -> Result<()> {
    let channel = BroadcastChannel::open(attach_config(matches))?;

    println!("Ring '{}'", channel.name());
    println!(
        "  Backing: {}",
        channel.region().metadata().backing_type.name()
    );
    println!("  Region size: {} bytes", channel.region().size());
    println!("  Capacity: {} bytes", channel.capacity());
    println!("  Max payload: {} bytes", channel.max_payload_length());
    println!("  Tail position: {}", channel.tail_position());
    println!("  Latest record position: {}", channel.latest_record_position());
    println!("  Library version: {}", crier::VERSION);
    Ok(())
}

fn generated_payload(sequence: usize, size: usize) -> Vec<u8> {
    let mut payload = format!("message {}", sequence).into_bytes();
    payload.resize(size, b'.');
    payload
}

fn preview(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let mut shown: String = text.chars().take(40).collect();
    if text.chars().count() > 40 {
        shown.push_str("...");
    }
    shown
}
