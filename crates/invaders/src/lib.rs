use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{anyhow, bail, Context, Result};
use typed_builder::TypedBuilder;

use invaders_core::machine::{CPU_CLOCK_HZ, NS_PER_FRAME};
use invaders_core::{InputLine, Machine, MachineConfig};

pub mod screen;

/// Frames a scripted button is held down for.
const HOLD_FRAMES: u32 = 5;

#[derive(Clone, Debug, TypedBuilder)]
pub struct RunConfig {
    pub rom_path: PathBuf,
    /// Number of video frames to run.
    #[builder(default = 600)]
    pub frames: u32,
    /// Sleep so each frame takes its real 1/59.94 s.
    #[builder(default = false)]
    pub paced: bool,
    /// Where to write the final frame as a PBM image.
    #[builder(default, setter(strip_option))]
    pub dump_path: Option<PathBuf>,
    /// Frame at which a coin is inserted.
    #[builder(default, setter(strip_option))]
    pub coin_frame: Option<u32>,
    /// Frame at which 1P start is pressed.
    #[builder(default, setter(strip_option))]
    pub start_frame: Option<u32>,
    #[builder(default)]
    pub machine: MachineConfig,
}

/// What a run did.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RunSummary {
    pub frames: u32,
    pub cycles: u64,
    pub halted: bool,
}

impl RunSummary {
    /// Guest time covered by the run at the board's 2 MHz clock.
    pub fn emulated_seconds(&self) -> f64 {
        self.cycles as f64 / f64::from(CPU_CLOCK_HZ)
    }
}

pub const USAGE: &str =
    "usage: invaders <rom> [frames] [--paced] [--dump out.pbm] [--coin FRAME] [--start FRAME]";

/// Build a [`RunConfig`] from command-line arguments (program name already
/// skipped).
pub fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<RunConfig> {
    let mut args = args.into_iter();
    let rom_path = args.next().ok_or_else(|| anyhow!("no ROM path provided"))?;

    let mut config = RunConfig::builder().rom_path(PathBuf::from(rom_path)).build();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--paced" => config.paced = true,
            "--dump" => {
                let path = args.next().ok_or_else(|| anyhow!("--dump needs a path"))?;
                config.dump_path = Some(PathBuf::from(path));
            }
            "--coin" => config.coin_frame = Some(frame_arg("--coin", args.next())?),
            "--start" => config.start_frame = Some(frame_arg("--start", args.next())?),
            other => match other.parse() {
                Ok(frames) => config.frames = frames,
                Err(_) => bail!("unknown argument '{other}'"),
            },
        }
    }
    Ok(config)
}

fn frame_arg(flag: &str, value: Option<String>) -> Result<u32> {
    let value = value.ok_or_else(|| anyhow!("{flag} needs a frame number"))?;
    value
        .parse()
        .with_context(|| format!("{flag} expects a frame number, got '{value}'"))
}

pub fn run(config: RunConfig) -> Result<RunSummary> {
    let rom = std::fs::read(&config.rom_path)
        .with_context(|| format!("failed to read ROM '{}'", config.rom_path.display()))?;
    let mut machine = Machine::new(&rom, config.machine)
        .with_context(|| format!("failed to load ROM '{}'", config.rom_path.display()))?;

    let dip = machine.io().dip();
    log::info!(
        "DIP: {} ships per credit, coin info {}",
        dip.ships_per_credit,
        if dip.show_coin_info { "shown" } else { "hidden" }
    );

    let summary = drive(&mut machine, &config)?;
    log::info!(
        "ran {} frames, {} cycles ({:.2} s emulated){}",
        summary.frames,
        summary.cycles,
        summary.emulated_seconds(),
        if summary.halted { ", halted" } else { "" }
    );

    if let Some(path) = &config.dump_path {
        let file = File::create(path)
            .with_context(|| format!("failed to create '{}'", path.display()))?;
        screen::write_pbm(&mut BufWriter::new(file), machine.video_ram())
            .with_context(|| format!("failed to write '{}'", path.display()))?;
        log::info!("wrote frame to '{}'", path.display());
    }

    Ok(summary)
}

/// Run the frame loop on an already built machine.
pub fn drive(machine: &mut Machine, config: &RunConfig) -> Result<RunSummary> {
    let frame_time = Duration::from_nanos(NS_PER_FRAME);
    let mut deadline = Instant::now();
    let mut frames = 0;

    while frames < config.frames {
        script_input(machine, config.coin_frame, InputLine::Coin, frames);
        script_input(machine, config.start_frame, InputLine::P1Start, frames);

        let frame = machine
            .run_frame()
            .with_context(|| format!("emulation stopped in frame {frames}"))?;
        frames += 1;
        if frame.halted {
            break;
        }

        if config.paced {
            deadline += frame_time;
            let now = Instant::now();
            if deadline > now {
                thread::sleep(deadline - now);
            } else {
                deadline = now;
            }
        }
    }

    Ok(RunSummary {
        frames,
        cycles: machine.total_cycles(),
        halted: machine.is_halted(),
    })
}

fn script_input(machine: &mut Machine, at: Option<u32>, line: InputLine, frame: u32) {
    let Some(at) = at else {
        return;
    };
    if frame == at {
        log::debug!("frame {frame}: press {line:?}");
        machine.set_input(line, true);
    } else if frame == at + HOLD_FRAMES {
        log::debug!("frame {frame}: release {line:?}");
        machine.set_input(line, false);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RunConfig {
        RunConfig::builder().rom_path(PathBuf::new()).frames(3).build()
    }

    #[test]
    fn drives_the_requested_frames() {
        // EI; JMP 0001h, with RET at both vectors
        let mut rom = vec![0x00; 0x11];
        rom[..4].copy_from_slice(&[0xfb, 0xc3, 0x01, 0x00]);
        rom[0x08] = 0xc9;
        rom[0x10] = 0xc9;
        let mut machine = Machine::from_rom(&rom).unwrap();

        let summary = drive(&mut machine, &config()).unwrap();
        assert_eq!(summary.frames, 3);
        assert!(!summary.halted);
        assert!(summary.cycles >= 3 * u64::from(invaders_core::machine::CYCLES_PER_FRAME));
    }

    #[test]
    fn stops_on_halt() {
        let mut machine = Machine::from_rom(&[0x76]).unwrap();
        let summary = drive(&mut machine, &config()).unwrap();
        assert_eq!(summary.frames, 1);
        assert!(summary.halted);
        assert_eq!(summary.cycles, 7);
    }

    #[test]
    fn faults_surface_as_errors() {
        let mut machine = Machine::from_rom(&[0xed]).unwrap();
        let err = drive(&mut machine, &config()).unwrap_err();
        assert!(err.to_string().contains("frame 0"));
    }

    #[test]
    fn scripted_coin_is_held_then_released() {
        let mut machine = Machine::from_rom(&[0xc3, 0x00, 0x00]).unwrap();
        script_input(&mut machine, Some(2), InputLine::Coin, 2);
        assert!(machine.io().inputs().is_pressed(InputLine::Coin));
        script_input(&mut machine, Some(2), InputLine::Coin, 2 + HOLD_FRAMES);
        assert!(!machine.io().inputs().is_pressed(InputLine::Coin));
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn parses_full_command_line() {
        let config = parse_args(args(&[
            "invaders.rom",
            "120",
            "--paced",
            "--dump",
            "out.pbm",
            "--coin",
            "10",
            "--start",
            "40",
        ]))
        .unwrap();
        assert_eq!(config.rom_path, PathBuf::from("invaders.rom"));
        assert_eq!(config.frames, 120);
        assert!(config.paced);
        assert_eq!(config.dump_path, Some(PathBuf::from("out.pbm")));
        assert_eq!(config.coin_frame, Some(10));
        assert_eq!(config.start_frame, Some(40));
    }

    #[test]
    fn bad_or_missing_values_are_usage_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["rom", "--coin", "x"])).is_err());
        assert!(parse_args(args(&["rom", "--start"])).is_err());
        assert!(parse_args(args(&["rom", "--dump"])).is_err());
        assert!(parse_args(args(&["rom", "--fast"])).is_err());
    }

    #[test]
    fn emulated_time_follows_the_clock() {
        let summary = RunSummary {
            frames: 0,
            cycles: 3_000_000,
            halted: false,
        };
        assert_eq!(summary.emulated_seconds(), 1.5);
    }

    #[test]
    fn missing_rom_is_reported() {
        let config = RunConfig::builder()
            .rom_path(PathBuf::from("/nonexistent/invaders.rom"))
            .build();
        let err = run(config).unwrap_err();
        assert!(err.to_string().contains("failed to read ROM"));
    }
}
