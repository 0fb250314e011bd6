//! Text front end for the buffer cell.
//!
//! Reads commands from stdin, one or more keys per line:
//!
//! ```text
//! u  index conveyor        i  index inlet        o  index outlet
//! p  transfer push         [  carriage down      ]  carriage up
//! v  cycle verticals       x  cycle transfer
//! a  toggle autorun        d  toggle downstream  f  toggle inflow
//! r  reset cell            e  speed up           w  speed down
//! k  acknowledge fault     0-3 select strategy   q  quit
//! t <ms>  let time pass    s <multiplier>  set speed
//! ```

use std::io::{self, BufRead, Write};

use buffersim::{BufferCell, CellConfig, Command, Simulation, Strategy};
use log::{error, info};

fn command_for_key(key: char) -> Option<Command> {
    let command = match key {
        'u' => Command::IndexConveyor,
        'i' => Command::IndexInlet,
        'o' => Command::IndexOutlet,
        'p' => Command::TransferPush,
        '[' => Command::MoveCarriageDown,
        ']' => Command::MoveCarriageUp,
        'v' => Command::CycleVerticals,
        'x' => Command::CycleTransfer,
        'a' => Command::ToggleAutorun,
        'd' => Command::ToggleDownstreamStoppage,
        'f' => Command::TogglePartInflow,
        'r' => Command::ResetCell,
        'e' => Command::SpeedUp,
        'w' => Command::SpeedDown,
        'k' => Command::AcknowledgeFault,
        '0'..='3' => Command::SetStrategy(Strategy::from_id(key as u8 - b'0').ok()?),
        _ => return None,
    };
    Some(command)
}

fn slot_char(occupied: bool) -> char {
    if occupied {
        '#'
    } else {
        '.'
    }
}

fn render(cell: &BufferCell) -> String {
    let mut out = String::new();
    let position = cell.carriage_position();
    out.push_str(&format!("    {:<5}{}\n", cell.inlet().side(), cell.outlet().side()));
    for slot in (0..cell.inlet().len()).rev() {
        let carriage = if slot == position { "=>" } else { "  " };
        out.push_str(&format!(
            "{:>3} {} {} {}\n",
            slot,
            slot_char(cell.inlet().is_occupied(slot)),
            carriage,
            slot_char(cell.outlet().is_occupied(slot)),
        ));
    }
    let conveyor: String = cell.conveyor().slots().iter().map(|p| slot_char(*p)).collect();
    out.push_str(&format!("    {}\n", conveyor));

    let status = cell.status();
    out.push_str(&format!(
        "strategy {} | speed {} ({}ms) | autorun {} | stoppage {} | inflow {} | inhibit {} | full {} | buffered {} | fault {}\n",
        status.strategy,
        status.speed,
        status.cycle_time_ms,
        status.autorun,
        status.downstream_stoppage,
        status.part_inflow,
        status.upstream_inhibit,
        status.buffer_full,
        status.parts_buffered,
        status
            .fault
            .map(|c| c.to_string())
            .unwrap_or_else(|| "none".to_string()),
    ));
    out
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let mut config = CellConfig::new();
    if let Some(seed) = std::env::args().nth(1).and_then(|s| s.parse().ok()) {
        config = config.with_seed(seed);
    }

    let mut sim = match Simulation::new(config) {
        Ok(sim) => sim,
        Err(err) => {
            error!("Invalid cell configuration: {}", err);
            std::process::exit(1);
        }
    };
    info!("Buffer cell ready (cycle time {}ms)", sim.cell().cycle_time_ms());

    let stdin = io::stdin();
    let mut stdout = io::stdout();
    for line in stdin.lock().lines() {
        let line = match line {
            Ok(line) => line,
            Err(err) => {
                error!("Failed to read input: {}", err);
                break;
            }
        };
        let line = line.trim();

        if let Some(ms) = line.strip_prefix("t ") {
            match ms.trim().parse::<u64>() {
                Ok(ms) => {
                    if let Err(err) = sim.advance(ms) {
                        error!("{}", err);
                    }
                }
                Err(_) => error!("Expected milliseconds after 't', got '{}'", ms),
            }
        } else if let Some(multiplier) = line.strip_prefix("s ") {
            match multiplier.trim().parse::<f64>() {
                Ok(m) => {
                    if let Err(err) = sim.apply(Command::SetSpeed(m)) {
                        error!("{}", err);
                    }
                }
                Err(_) => error!("Expected a speed multiplier after 's', got '{}'", multiplier),
            }
        } else {
            for key in line.chars() {
                if key == 'q' {
                    return;
                }
                match command_for_key(key) {
                    // errors are already logged by the cell
                    Some(command) => {
                        let _ = sim.apply(command);
                    }
                    None => error!("Unknown key '{}'", key),
                }
            }
        }

        let _ = write!(stdout, "{}", render(sim.cell()));
        let _ = stdout.flush();
    }
}
