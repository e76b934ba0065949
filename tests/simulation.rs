use std::thread;

use fuzzy_assign::elevator::{self, Direction, Request};
use fuzzy_assign::{ControlSystem, FuzzyError, MembershipFunction, SimulationState, Universe};

fn load_priority() -> ControlSystem {
    let mut builder = ControlSystem::builder();
    let load = builder
        .add_input("load", Universe::with_step(0. ..=100., 1.).unwrap())
        .unwrap();
    let priority = builder
        .add_output("priority", Universe::with_step(0. ..=10., 1.).unwrap())
        .unwrap();

    builder
        .define_term(load, "light", MembershipFunction::triangular(0., 0., 50.).unwrap())
        .unwrap();
    builder
        .define_term(load, "heavy", MembershipFunction::triangular(50., 100., 100.).unwrap())
        .unwrap();
    builder
        .define_term(priority, "low", MembershipFunction::triangular(0., 0., 5.).unwrap())
        .unwrap();
    builder
        .define_term(priority, "high", MembershipFunction::triangular(5., 10., 10.).unwrap())
        .unwrap();

    let premise = builder.is(load, "heavy").unwrap();
    let high = builder.then(priority, "high").unwrap();

    builder.rule(premise, [high]).unwrap();
    builder.build().unwrap()
}

#[test]
fn heavy_load_raises_priority() {
    let system = load_priority();
    let mut sim = system.simulation();

    sim.set_input("load", 80.).unwrap();
    sim.compute().unwrap();

    assert_eq!(sim.firing_strengths().unwrap(), &[0.6]);

    let aggregated = sim.aggregated("priority").unwrap();

    assert_eq!(&aggregated[..5], &[0.; 5]);
    assert_eq!(aggregated[6], 0.2);
    assert_eq!(aggregated[7], 0.4);
    assert_eq!(&aggregated[8..], &[0.6, 0.6, 0.6]);

    let crisp = sim.get_output("priority").unwrap();

    assert!((crisp - 20.2 / 2.4).abs() < 1e-9, "got {crisp}");
    assert!(crisp > 5. && crisp < 10.);
}

#[test]
fn light_load_fires_nothing_and_reports_midpoint() {
    let system = load_priority();
    let mut sim = system.simulation();

    sim.set_input("load", 10.).unwrap();
    sim.compute().unwrap();

    assert!(sim.fell_back("priority").unwrap());
    assert_eq!(sim.get_output("priority").unwrap(), 5.);
}

#[test]
fn lifecycle_errors() {
    let system = load_priority();
    let mut sim = system.simulation();

    assert_eq!(sim.state(), SimulationState::Uninitialized);
    assert_eq!(sim.compute(), Err(FuzzyError::MissingInput("load".into())));
    assert_eq!(sim.get_output("priority"), Err(FuzzyError::NotComputed));
}

#[test]
fn independent_simulations_share_one_system() {
    let system = elevator::control_system().unwrap();
    let requests = [
        (
            Request {
                current_floor: 2.,
                destination_floor: 17.,
                number_of_passengers: 3.,
                elevator_load: 20.,
                direction_of_travel: Direction::Idle,
            },
            1.,
        ),
        (
            Request {
                current_floor: 9.,
                destination_floor: 9.,
                number_of_passengers: 2.,
                elevator_load: 90.,
                direction_of_travel: Direction::Up,
            },
            3.,
        ),
        (
            Request {
                current_floor: 9.,
                destination_floor: 9.,
                number_of_passengers: 5.,
                elevator_load: 50.,
                direction_of_travel: Direction::Down,
            },
            2.,
        ),
    ];

    thread::scope(|scope| {
        let handles: Vec<_> = requests
            .iter()
            .cycle()
            .take(24)
            .map(|(request, expected)| {
                let system = &system;

                scope.spawn(move || (request.assign(system).unwrap(), *expected))
            })
            .collect();

        for handle in handles {
            let (assigned, expected) = handle.join().unwrap();

            assert!((assigned - expected).abs() < 1e-9, "assigned {assigned}, expected {expected}");
        }
    });
}

#[test]
fn high_to_low_while_idle_prefers_third_car() {
    let system = elevator::control_system().unwrap();
    let mut sim = system.simulation();

    sim.set_input(elevator::CURRENT_FLOOR, 18.).unwrap();
    sim.set_input(elevator::DESTINATION_FLOOR, 1.).unwrap();
    sim.set_input(elevator::NUMBER_OF_PASSENGERS, 4.).unwrap();
    sim.set_input(elevator::ELEVATOR_LOAD, 30.).unwrap();
    sim.set_input(elevator::DIRECTION_OF_TRAVEL, Direction::Idle.into()).unwrap();
    sim.compute().unwrap();

    assert_eq!(sim.firing_strengths().unwrap(), &[0., 0., 1., 0.]);
    assert!(!sim.fell_back(elevator::ELEVATOR_ASSIGNMENT).unwrap());
    assert!((sim.get_output(elevator::ELEVATOR_ASSIGNMENT).unwrap() - 2.).abs() < 1e-9);
}
