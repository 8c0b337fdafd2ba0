use log::error;
use waypoint_planner::{Config, LightColor, LightObservation, Planner, Pose, Waypoint};

fn main() {
    env_logger::init();

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.json".to_string());
    let config = match Config::load(&path) {
        Ok(config) => config,
        Err(err) => {
            error!("refusing to start: {}", err);
            std::process::exit(1);
        }
    };
    let cycle_time = config.cycle_time;
    let stop_lines = config.stop_line_points();

    let mut planner = match Planner::new(config) {
        Ok(planner) => planner,
        Err(err) => {
            error!("refusing to start: {}", err);
            std::process::exit(1);
        }
    };

    // A straight 500 m path with a waypoint every metre.
    planner.on_path((0..500).map(|i| Waypoint::new(i as f64, 0.0, 0.0)).collect());

    // Drive towards the first stop line: red until t = 30 s, then green.
    let mut x = 0.0;
    let mut speed = 0.0;
    for cycle in 0..300 {
        let color = if cycle < 150 {
            LightColor::Red
        } else {
            LightColor::Green
        };
        let observations: Vec<_> = stop_lines
            .iter()
            .map(|&stop_line| LightObservation { stop_line, color })
            .collect();

        planner.on_speed(speed);
        planner.on_lights(&observations);
        planner.on_pose(Pose::new(x, 0.0, 0.0));

        // Track the first commanded speed, as a driven vehicle would.
        if let Some(first) = planner.profile().and_then(|p| p.points().first().copied()) {
            speed = first.speed;
            x += speed * cycle_time;
        }

        if cycle % 25 == 0 {
            println!(
                "t={:5.1}s  x={:6.1}m  v={:5.2}m/s  cte={:5.2?}  stop={:?}",
                cycle as f64 * cycle_time,
                x,
                speed,
                planner.cross_track_error(),
                planner.stop_waypoint(),
            );
        }
    }
}
