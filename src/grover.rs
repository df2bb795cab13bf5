use qcircuit_sim::{
    circuit::Circuit,
    error::Result,
    gate::Reg,
    register::Register,
};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;

const SIZE: usize = 4;
const NEEDLE: usize = 11;

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
    circuit.initialize(SIZE, 0, 0);
    for j in 1..=SIZE {
        circuit.add_hadamard(Reg::X, j)?;
    }
    let iters = Register::grover_steps(SIZE);
    for _ in 0..iters {
        circuit.add_grover(Reg::X, NEEDLE)?;
    }
    circuit.add_measurement(Reg::X, vec![])?;
    info!(size = SIZE, needle = NEEDLE, iters, "searching");

    while circuit.next_gate().is_some_and(|g| !g.is_measurement()) {
        circuit.set_next_step()?;
        let p = circuit.x_register().probabilities()[NEEDLE];
        println!(
            "step {:2}: P({}) = {:.4}",
            circuit.next_gate_number() - 1, NEEDLE, p,
        );
    }
    circuit.set_final_step()?;
    println!("{:?}", circuit.outcomes());
    println!("{}", circuit.x_register());
    Ok(())
}
