//! Evolves a feedforward XOR solver and prints its behaviour on every row.

use neat_core::{FeedforwardNetwork, NeatParams, Neat, NeuralNetwork, Real};

const XOR_ROWS: [([Real; 2], Real); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

fn evaluate(neat: &mut Neat) {
    let ids: Vec<_> = neat.population().ids().collect();
    for id in ids {
        let genome = neat.population().get(id).clone();
        let mut net = FeedforwardNetwork::new();
        genome.decode(&mut net);
        net.finalize();

        let mut error = 0.0;
        for (inputs, target) in XOR_ROWS {
            let out = net.activate(&inputs).unwrap();
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

    for generation in 0..100 {
        evaluate(&mut neat);
        neat.epoch().expect("population never collapses on XOR");

        if generation % 10 == 0 {
            let best = neat.best_ever().unwrap();
            println!("generation {generation}: best-ever fitness = {:.4}", best.fitness);
        }
    }

    let champion = neat.best_ever().unwrap().clone();
    let mut net = FeedforwardNetwork::new();
    champion.decode(&mut net);
    net.finalize();

    for (inputs, target) in XOR_ROWS {
        let out = net.activate(&inputs).unwrap();
        println!("{:?} -> {:.4} (target {})", inputs, out[0], target);
    }
}
