//! Evolves a continuous-time (CTRNN) XOR solver: each row is held on the
//! input for several integration steps before the output is read, giving
//! the leaky-integrator dynamics time to settle.

use neat_core::{CtrnnNetwork, NeatParams, Neat, NeuralNetwork, Real};

const XOR_ROWS: [([Real; 2], Real); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

const SETTLE_STEPS: usize = 20;

fn evaluate(neat: &mut Neat) {
    let ids: Vec<_> = neat.population().ids().collect();
    for id in ids {
        let genome = neat.population().get(id).clone();
        let mut net = CtrnnNetwork::new().with_time_step(0.05);
        genome.decode(&mut net);

        let mut error = 0.0;
        for (inputs, target) in XOR_ROWS {
            let mut out = vec![0.0];
            for _ in 0..SETTLE_STEPS {
                out = net.activate(&inputs).unwrap();
            }
            error += (target - out[0]).powi(2);
        }
        neat.population_mut().get_mut(id).fitness = 4.0 - error;
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init()
        .unwrap_or(());

    let params = NeatParams::new(2, 1);
    let mut neat = Neat::init(params, 42).expect("valid configuration");

    for generation in 0..200 {
        evaluate(&mut neat);
        neat.epoch().expect("population never collapses on XOR");

        if generation % 20 == 0 {
            let best = neat.best_ever().unwrap();
            println!(
                "generation {generation}: best-ever fitness = {:.4}, species = {}",
                best.fitness,
                neat.species().len()
            );
        }
    }

    println!(
        "final best-ever fitness = {:.4}",
        neat.best_ever().unwrap().fitness
    );
}
