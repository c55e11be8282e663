//! End-to-end XOR evolution: within 100 epochs with default parameters
//! and a fixed seed, best-ever fitness should reach at least 3.9.

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

#[test]
fn xor_reaches_near_perfect_fitness_within_100_epochs() {
    let params = NeatParams::new(2, 1);
    let mut neat = Neat::init(params, 42).expect("valid configuration");

    for _ in 0..100 {
        evaluate(&mut neat);
        neat.epoch().expect("population never collapses on XOR");
    }

    let best = neat.best_ever().expect("at least one epoch ran");
    assert!(
        best.fitness >= 3.9,
        "expected best-ever fitness >= 3.9, got {}",
        best.fitness
    );
}
