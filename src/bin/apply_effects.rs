use kolour_fx::composite::get_selection;
use kolour_fx::config::effects;
use kolour_fx::diagnostics::RunReport;
use kolour_fx::effects::apply_chain;
use kolour_fx::image::io::{load_rgba_image, save_rgba_image, write_json_file};
use log::info;
use std::env;
use std::path::Path;

fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let config_path = env::args().nth(1).ok_or_else(usage)?;
    let config = effects::load_config(Path::new(&config_path))?;

    let loaded = load_rgba_image(&config.input)?;
    let input = match &config.selection {
        Some(shape) => get_selection(&loaded, shape),
        None => loaded,
    };
    info!(
        "Loaded {} ({}x{}), applying {} effects",
        config.input.display(),
        input.width(),
        input.height(),
        config.effects.len()
    );

    let (output, timings) = apply_chain(&input, &config.effects);
    save_rgba_image(&output, &config.output.image)?;
    println!(
        "Saved {}x{} image to {} in {:.3} ms",
        output.width(),
        output.height(),
        config.output.image.display(),
        timings.total_ms
    );

    if let Some(report_path) = &config.output.report_json {
        let report = RunReport::from_run(&input, &output, &config.effects, timings);
        write_json_file(report_path, &report)?;
        println!("Saved run report to {}", report_path.display());
    }

    Ok(())
}

fn usage() -> String {
    "Usage: apply_effects <config.json>".to_string()
}
