use sequential_nn::config::{load_config, TrainingConfig};
use sequential_nn::layers::{DenseLayer, Layer, RecurrentLayer};
use sequential_nn::loss::MSE;
use sequential_nn::model::{Sequential, TrainingHistory};
use sequential_nn::optimizers::SGD;
use sequential_nn::utils::SimpleRng;
use sequential_nn::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

// XOR networks and one recurrent sequence model, trained one sample at a time.
const EPOCHS: usize = 1000;
const REPORT_INTERVAL: usize = 100;
const SEED: u64 = 42;
// Sigmoid-only nets tolerate a larger step than the ReLU and tanh ones.
const SIGMOID_LEARNING_RATE: f64 = 0.5;
const LEARNING_RATE: f64 = 0.1;

// Recurrent demo sizes.
const SEQUENCE_LENGTH: usize = 5;
const FEATURES: usize = 3;
const HIDDEN_SIZE: usize = 8;
const STEP_OUTPUT: usize = 2;

// Hyperparameters shared by every demo run; a config file overrides them.
#[derive(Debug, Clone, PartialEq)]
struct Settings {
    learning_rate: Option<f64>,
    epochs: usize,
    report_interval: usize,
    seed: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            learning_rate: None,
            epochs: EPOCHS,
            report_interval: REPORT_INTERVAL,
            seed: SEED,
        }
    }
}

impl Settings {
    fn from_config(config: &TrainingConfig) -> Self {
        Self {
            learning_rate: Some(config.learning_rate),
            epochs: config.epochs,
            report_interval: config.report_interval.unwrap_or(REPORT_INTERVAL),
            seed: config.seed.unwrap_or(SEED),
        }
    }

    fn learning_rate_or(&self, default: f64) -> f64 {
        self.learning_rate.unwrap_or(default)
    }
}

// Optional first argument: path to a training config JSON.
fn settings_from_args(args: &[String]) -> Result<Settings> {
    match args.get(1) {
        Some(path) => {
            let config = load_config(path)?;
            tracing::info!("Loaded training config from {}", path);
            Ok(Settings::from_config(&config))
        }
        None => Ok(Settings::default()),
    }
}

// XOR truth table; `low` is the target for equal inputs (0 for sigmoid, -1 for tanh).
fn xor_dataset(low: f64) -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let inputs = vec![
        vec![0.0, 0.0],
        vec![0.0, 1.0],
        vec![1.0, 0.0],
        vec![1.0, 1.0],
    ];
    let targets = vec![vec![low], vec![1.0], vec![1.0], vec![low]];
    (inputs, targets)
}

fn build_model(layers: Vec<Box<dyn Layer>>, learning_rate: f64, settings: &Settings) -> Result<Sequential> {
    let mut model = Sequential::new(Box::new(MSE), Box::new(SGD::new(learning_rate)))
        .with_epochs(settings.epochs)
        .with_report_interval(settings.report_interval);
    for layer in layers {
        model.add_layer(layer)?;
    }
    Ok(model)
}

// Train one XOR network and return its predictions for the four inputs.
fn run_xor(title: &str, model: &mut Sequential, low: f64) -> Result<Vec<f64>> {
    println!("\n=== {} ===", title);
    let (inputs, targets) = xor_dataset(low);
    let history = model.train(&inputs, &targets)?;
    if let Some(loss) = history.final_loss() {
        println!("Final average loss: {:.6}", loss);
    }

    let mut predictions = Vec::with_capacity(inputs.len());
    for (input, target) in inputs.iter().zip(&targets) {
        let prediction = model.predict(input)?[0];
        println!(
            "{} XOR {} = {:.4} (expected {})",
            input[0], input[1], prediction, target[0]
        );
        predictions.push(prediction);
    }
    Ok(predictions)
}

// Fit one random sequence to random targets.
fn run_sequence(settings: &Settings, rng: &mut SimpleRng) -> Result<TrainingHistory> {
    println!("\n=== Recurrent layer ===");
    let layer = RecurrentLayer::new(FEATURES, HIDDEN_SIZE, STEP_OUTPUT, SEQUENCE_LENGTH, rng)?;
    let input: Vec<f64> = (0..layer.input_size()).map(|_| rng.gen_range(-1.0, 1.0)).collect();
    let target: Vec<f64> = (0..layer.output_size()).map(|_| rng.gen_range(-1.0, 1.0)).collect();

    let mut model = build_model(vec![Box::new(layer)], settings.learning_rate_or(LEARNING_RATE), settings)?;
    let history = model.train(&[input.clone()], &[target])?;

    let prediction = model.predict(&input)?;
    let formatted: Vec<String> = prediction.iter().map(|v| format!("{:.3}", v)).collect();
    println!("Prediction: [{}]", formatted.join(", "));
    println!("Prediction size: {}", prediction.len());
    Ok(history)
}

fn run(settings: &Settings) -> Result<()> {
    let mut rng = SimpleRng::new(settings.seed);

    let mut sigmoid = build_model(
        vec![
            Box::new(DenseLayer::sigmoid(2, 4, &mut rng)),
            Box::new(DenseLayer::sigmoid(4, 1, &mut rng)),
        ],
        settings.learning_rate_or(SIGMOID_LEARNING_RATE),
        settings,
    )?;
    run_xor("Sigmoid network for XOR", &mut sigmoid, 0.0)?;

    let mut relu = build_model(
        vec![
            Box::new(DenseLayer::relu(2, 4, &mut rng)),
            Box::new(DenseLayer::sigmoid(4, 1, &mut rng)),
        ],
        settings.learning_rate_or(LEARNING_RATE),
        settings,
    )?;
    run_xor("ReLU network for XOR", &mut relu, 0.0)?;

    let mut tanh = build_model(
        vec![
            Box::new(DenseLayer::tanh(2, 4, &mut rng)),
            Box::new(DenseLayer::tanh(4, 1, &mut rng)),
        ],
        settings.learning_rate_or(LEARNING_RATE),
        settings,
    )?;
    run_xor("Tanh network for XOR", &mut tanh, -1.0)?;

    run_sequence(settings, &mut rng)?;
    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args: Vec<String> = std::env::args().collect();
    let result = settings_from_args(&args).and_then(|settings| run(&settings));
    if let Err(err) = result {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}
