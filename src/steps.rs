use qcircuit_sim::{
    circuit::Circuit,
    error::{ Error, Result },
    gate::{ Axis, Function, Reg },
};
use tracing::{ info, warn };
use tracing_subscriber::filter::LevelFilter;

fn main() -> Result<()> {
    let level
        = std::env::var("QCIRCUIT_LOG").unwrap_or_default()
        .parse::<LevelFilter>()
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let mut circuit = Circuit::new(Some(10546));
    circuit.initialize(2, 2, 0);
    circuit
        .add_hadamard(Reg::X, 1)?
        .add_cnot(Reg::X, 1, 2)?
        .add_s(Reg::X, 2)?
        .add_t(Reg::X, 1)?
        .add_rotation(Reg::Y, vec![1], Axis::X, 0.3)?
        .add_function(Function::new(|x: i64, z: i64| (x + z) % 4, None))?
        .add_measurement(Reg::X, vec![1])?
        .add_qft(Reg::Y)?;

    println!("init: x = {}, y = {}", circuit.x_register(), circuit.y_register());
    while circuit.next_gate_number() < circuit.len() {
        let Some(gate) = circuit.next_gate().cloned() else { break; };
        circuit.set_next_step()?;
        println!(
            "{} {}: x = {}, y = {}",
            circuit.next_gate_number() - 1,
            gate,
            circuit.x_register(),
            circuit.y_register(),
        );
    }

    info!("stepping back");
    loop {
        let Some(gate) = circuit.previous_gate().cloned() else { break; };
        match circuit.set_previous_step() {
            Ok(_) => {
                println!(
                    "undo {}: x = {}, y = {}",
                    gate,
                    circuit.x_register(),
                    circuit.y_register(),
                );
            },
            Err(err @ Error::Irreversible { .. }) => {
                warn!("{}", err);
                break;
            },
            Err(err) => { return Err(err); },
        }
    }
    println!("{:?}", circuit.outcomes());
    Ok(())
}
