use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Context;
use chrono::Local;
use colored::*;
use tracing::{Instrument, info_span, warn};

use crate::commands::CommandLine;
use crate::terminal::input::InputHandle;
use crate::terminal::{colors, print, spinner};
use crate::tprint;
use topomap_common::config::{DiscoveryConfig, load_seed_file};
use topomap_common::network::subnet::parse_subnets;
use topomap_core::serialize::OutputFormat;
use topomap_core::network::ssh::SshExecutor;
use topomap_core::topology::{Device, DeviceStatus, Termination};
use topomap_core::{DiscoveryEngine, Topology};
use topomap_protocols::IosParser;

type Detail = (String, ColoredString);

pub async fn discover(args: &CommandLine) -> anyhow::Result<()> {
    let config = build_config(args)?;
    print_config(&config, args);

    let stop_signal = Arc::new(AtomicBool::new(false));
    let mut input = InputHandle::new(stop_signal.clone());
    input.start();
    let ctrl_c = tokio::spawn({
        let stop_signal = stop_signal.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                stop_signal.store(true, Ordering::Relaxed);
            }
        }
    });

    let engine = DiscoveryEngine::new(
        Box::new(SshExecutor::from_config(&config)),
        Box::new(IosParser::new()),
    )
    .with_stop_signal(stop_signal)
    .with_progress(Box::new(spinner::report_discovery_progress));

    spinner::start_discovery_spinner();
    let start_time = Instant::now();
    let result = engine
        .discover(&config)
        .instrument(info_span!("discovery"))
        .await;

    spinner::stop_discovery_spinner();
    input.stop();
    ctrl_c.abort();

    let topology = result.context("discovery could not start")?;
    discovery_ends(&topology, start_time.elapsed(), args.quiet);

    let format = OutputFormat::from(args.format);
    let path = write_document(&topology, &args.output_dir, format)?;
    print::print_status(format!("Topology written to {}", path.display().to_string().bold()));
    Ok(())
}

fn build_config(args: &CommandLine) -> anyhow::Result<DiscoveryConfig> {
    let seeds = load_seed_file(&args.devices, args.password.as_deref())
        .with_context(|| format!("could not load seed devices from {}", args.devices.display()))?;
    let ignored = parse_subnets(&args.ignore_subnets).context("invalid --ignore-subnets value")?;

    let config = DiscoveryConfig::new(seeds)
        .with_ignored_subnets(ignored)
        .with_max_devices(args.max_devices)
        .with_parallelism(args.parallelism)
        .with_timeouts(
            Duration::from_secs(args.connect_timeout),
            Duration::from_secs(args.command_timeout),
        )
        .with_run_timeout(args.run_timeout.map(Duration::from_secs))
        .with_verbose(args.verbose);

    config.validate().context("invalid discovery settings")?;
    Ok(config)
}

fn print_config(config: &DiscoveryConfig, args: &CommandLine) {
    if args.quiet > 0 {
        return;
    }

    let ignored = if config.ignored_subnets.is_empty() {
        "none".to_string()
    } else {
        config
            .ignored_subnets
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    print::align_keys(&["Seeds", "Max devices", "Ignored", "Parallelism"]);
    print::aligned_line("Seeds", config.seeds.len().to_string());
    print::aligned_line("Max devices", config.max_devices.to_string());
    print::aligned_line("Ignored", ignored);
    print::aligned_line("Parallelism", config.parallelism.to_string());
}

fn write_document(
    topology: &Topology,
    output_dir: &Path,
    format: OutputFormat,
) -> anyhow::Result<PathBuf> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("could not create {}", output_dir.display()))?;

    let file_name = format!(
        "discovery_{}.{}",
        Local::now().format("%Y%m%d_%H%M%S"),
        format.extension()
    );
    let path = output_dir.join(file_name);
    let document = format.render(topology)?;

    fs::write(&path, document).with_context(|| format!("could not write {}", path.display()))?;
    Ok(path)
}

fn discovery_ends(topology: &Topology, total_time: Duration, q_level: u8) {
    match topology.run().termination {
        Termination::Exhausted => {}
        Termination::DeviceCap => warn!(
            "device cap of {} reached, some neighbors were not visited",
            topology.run().max_devices
        ),
        Termination::Cancelled => warn!("discovery stopped early, topology is partial"),
        Termination::TimedOut => warn!("run timeout reached, topology is partial"),
    }

    if q_level == 0 {
        print::header("Network Topology", q_level);
        print_devices(topology);
    }
    print_summary(topology, total_time, q_level);
}

fn print_devices(topology: &Topology) {
    let device_count = topology.device_count();
    for (idx, device) in topology.devices().enumerate() {
        print::tree_head(idx, &device.display_name());
        print::as_tree_one_level(device_details(topology, device));
        if idx + 1 != device_count {
            tprint!();
        }
    }
}

fn device_details(topology: &Topology, device: &Device) -> Vec<Detail> {
    let mut details: Vec<Detail> = vec![
        ("Identity".to_string(), device.identity.to_string().normal()),
        ("Status".to_string(), status_to_detail(&device.status)),
        ("Depth".to_string(), device.discovery_depth.to_string().normal()),
    ];

    let attributes = &device.attributes;
    if let Some(platform) = &attributes.platform {
        details.push(("Platform".to_string(), platform.normal()));
    }
    if let Some(version) = &attributes.software_version {
        details.push(("Version".to_string(), version.normal()));
    }
    details.push(("Role".to_string(), attributes.role.to_string().normal()));

    let neighbors: Vec<String> = topology
        .neighbors_of(&device.identity)
        .map(|id| {
            topology
                .device(id)
                .map(Device::display_name)
                .unwrap_or_else(|| id.to_string())
        })
        .collect();
    if !neighbors.is_empty() {
        details.push(("Neighbors".to_string(), neighbors.join(", ").normal()));
    }
    if !device.failures.is_empty() {
        let failed: Vec<&str> = device.failures.iter().map(|f| f.command.as_str()).collect();
        details.push(("Failed".to_string(), failed.join(", ").yellow()));
    }

    details
}

fn status_to_detail(status: &DeviceStatus) -> ColoredString {
    match status {
        DeviceStatus::Reachable => status.label().color(colors::REACHABLE),
        DeviceStatus::Unreachable { reason } => {
            format!("{} ({reason})", status.label()).color(colors::UNREACHABLE)
        }
        DeviceStatus::Skipped { reason } => {
            format!("{} ({reason})", status.label()).color(colors::SKIPPED)
        }
        DeviceStatus::Pending => status.label().color(colors::PENDING),
    }
}

fn print_summary(topology: &Topology, total_time: Duration, q_level: u8) {
    let reachable = format!("{} reachable", topology.count_by_status("reachable")).bold().green();
    let unreachable = format!("{} unreachable", topology.count_by_status("unreachable")).red();
    let skipped = format!("{} skipped", topology.count_by_status("skipped")).yellow();
    let edges = format!("{} links", topology.edge_count()).bold();
    let total_time = format!("{:.2}s", total_time.as_secs_f64()).bold().yellow();

    let output = format!(
        "Discovery Complete: {reachable}, {unreachable}, {skipped}, {edges} in {total_time}"
    )
    .color(colors::TEXT_DEFAULT);

    match q_level {
        0 => {
            print::fat_separator();
            print::centerln(&output.to_string());
        }
        _ => print::print(&output.to_string()),
    }
}
