use anyhow::{bail, Context, Result};
use candle_core::Device;
use clap::{value_parser, Arg, ArgMatches, Command};
use rnn_codec::core::model::CheckpointStore;
use rnn_codec::core::tensors::RgbImage;
use rnn_codec::core::training::{BatchSource, ImageDataset, JsonlSink, Trainer};
use rnn_codec::core::{
    BottleneckBudget, CodeContainer, ModelConfig, NeuralCodec, PerceptualLossNet, TrainConfig,
};
use std::path::{Path, PathBuf};

fn main() {
    env_logger::init();

    let matches = Command::new("rnn_codec")
        .version(env!("CARGO_PKG_VERSION"))
        .about("순환 잔차 신경망 이미지 코덱")
        .subcommand_required(true)
        .subcommand(
            Command::new("train")
                .about("인코더 / 이진화기 / 디코더 학습")
                .arg(path_flag("config", "학습 구성 JSON").required(true))
                .arg(path_flag("train", "학습 이미지 safetensors (`images`)").required(true))
                .arg(path_flag("val", "검증 이미지 safetensors (`images`)"))
                .arg(path_flag("perceptual", "VGG16 가중치 safetensors")),
        )
        .subcommand(
            Command::new("encode")
                .about("이미지를 바이트 예산에 맞춰 인코드")
                .arg(path_flag("model-dir", "체크포인트 디렉토리").required(true))
                .arg(path_flag("config", "모델 구성이 담긴 학습 구성 JSON"))
                .arg(path_flag("input", "입력 이미지 (PNG / JPEG)").required(true))
                .arg(
                    Arg::new("budget")
                        .long("budget")
                        .short('b')
                        .value_name("BYTES")
                        .help("병목 크기 (4096, 16384, 65536)")
                        .value_parser(value_parser!(usize))
                        .default_value("4096"),
                )
                .arg(path_flag("output", "출력 코드 파일").required(true)),
        )
        .subcommand(
            Command::new("decode")
                .about("코드 파일을 이미지로 디코드")
                .arg(path_flag("model-dir", "체크포인트 디렉토리").required(true))
                .arg(path_flag("config", "모델 구성이 담긴 학습 구성 JSON"))
                .arg(path_flag("input", "입력 코드 파일").required(true))
                .arg(path_flag("output", "출력 이미지 (확장자로 형식 결정)").required(true)),
        )
        .subcommand(
            Command::new("info")
                .about("체크포인트 파일의 텐서 목록")
                .arg(
                    Arg::new("checkpoint")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("safetensors 체크포인트"),
                ),
        )
        .get_matches();

    let result = match matches.subcommand() {
        Some(("train", sub)) => handle_train(sub),
        Some(("encode", sub)) => handle_encode(sub),
        Some(("decode", sub)) => handle_decode(sub),
        Some(("info", sub)) => handle_info(sub),
        _ => unreachable!("subcommand_required"),
    };

    if let Err(e) = result {
        eprintln!("오류: {:#}", e);
        std::process::exit(1);
    }
}

fn path_flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("PATH")
        .value_parser(value_parser!(PathBuf))
        .help(help)
}

fn required_path(matches: &ArgMatches, name: &str) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(name)
        .cloned()
        .with_context(|| format!("missing --{name}"))
}

fn model_config(matches: &ArgMatches) -> Result<ModelConfig> {
    match matches.get_one::<PathBuf>("config") {
        Some(path) => Ok(TrainConfig::from_json_file(path)
            .with_context(|| format!("failed to read config {}", path.display()))?
            .model),
        None => Ok(ModelConfig::default()),
    }
}

fn load_codec(matches: &ArgMatches) -> Result<NeuralCodec> {
    let config = model_config(matches)?;
    let store = CheckpointStore::new(required_path(matches, "model-dir")?, &config.name);
    if !store.exists() {
        bail!("no checkpoint for `{}` in {}", config.name, store.dir().display());
    }
    let codec = NeuralCodec::load(config, &Device::Cpu, &store)?;
    Ok(codec)
}

fn read_image(path: &Path) -> Result<RgbImage> {
    let image = image::open(path)
        .with_context(|| format!("failed to read image {}", path.display()))?;
    Ok(image.to_rgb8())
}

fn write_image(path: &Path, image: &RgbImage) -> Result<()> {
    image
        .save(path)
        .with_context(|| format!("failed to write image {}", path.display()))?;
    Ok(())
}

fn handle_train(matches: &ArgMatches) -> Result<()> {
    let config_path = required_path(matches, "config")?;
    let mut config = TrainConfig::from_json_file(&config_path)
        .with_context(|| format!("failed to read config {}", config_path.display()))?;
    let device = config.device.to_device()?;

    let mut train = ImageDataset::from_safetensors(
        required_path(matches, "train")?,
        config.batch_size,
        &device,
    )?
    .with_shuffle(config.shuffle_seed);

    let mut val = match matches.get_one::<PathBuf>("val") {
        Some(path) => Some(ImageDataset::from_safetensors(path, config.batch_size, &device)?),
        None => {
            if config.validate {
                log::warn!("검증 데이터가 없어 검증을 끕니다");
            }
            config.validate = false;
            None
        }
    };

    let perceptual = match matches.get_one::<PathBuf>("perceptual") {
        Some(path) => Some(PerceptualLossNet::from_safetensors(path, &device)?),
        None => None,
    };

    let sink = JsonlSink::create(&config.log_dir, &config.model.name)?;
    let mut trainer = Trainer::from_config(config, perceptual, sink)?;
    let outcome = trainer.train(
        &mut train,
        val.as_mut().map(|v| v as &mut dyn BatchSource),
    )?;

    println!(
        "학습 종료: {:?}, {} 에포크, 최고 검증 손실 {:?}",
        outcome.stop, outcome.epochs_run, outcome.best_val_loss
    );
    println!("체크포인트: {}", trainer.store().dir().display());
    Ok(())
}

fn handle_encode(matches: &ArgMatches) -> Result<()> {
    let codec = load_codec(matches)?;
    let budget = *matches
        .get_one::<usize>("budget")
        .context("missing --budget")?;
    let budget_class = BottleneckBudget::try_from(budget)?;

    let input = required_path(matches, "input")?;
    let image = read_image(&input)?;
    let payload = codec.encode(&image, budget)?;
    let container = CodeContainer::new(budget_class, payload)?;

    let output = required_path(matches, "output")?;
    std::fs::write(&output, container.to_bytes()?)
        .with_context(|| format!("failed to write {}", output.display()))?;
    println!(
        "인코드: {} → {} ({} 바이트, 예산 {})",
        input.display(),
        output.display(),
        container.payload.len(),
        budget_class
    );
    Ok(())
}

fn handle_decode(matches: &ArgMatches) -> Result<()> {
    let codec = load_codec(matches)?;
    let input = required_path(matches, "input")?;
    let bytes =
        std::fs::read(&input).with_context(|| format!("failed to read {}", input.display()))?;
    let container = CodeContainer::from_bytes(&bytes)?;

    let image = codec.decode(&container.payload, container.budget.bytes())?;
    let output = required_path(matches, "output")?;
    write_image(&output, &image)?;
    println!("디코드: {} → {}", input.display(), output.display());
    Ok(())
}

fn handle_info(matches: &ArgMatches) -> Result<()> {
    let path = required_path(matches, "checkpoint")?;
    let bytes =
        std::fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let tensors = safetensors::SafeTensors::deserialize(&bytes)?;

    let mut names = tensors.names();
    names.sort();
    let mut total = 0usize;
    println!("{}", path.display());
    for name in names {
        let view = tensors.tensor(name)?;
        let count: usize = view.shape().iter().product();
        total += count;
        println!("  {:<40} {:?} {:?}", name, view.dtype(), view.shape());
    }
    println!("총 파라미터: {}", total);
    Ok(())
}
