fn main() -> Result<(), eframe::Error> {
    // Set up logging for development
    env_logger::init();

    graph_canvas::run_app()
}
