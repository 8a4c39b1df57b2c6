use std::path::PathBuf;
use std::process::ExitCode;

use namecard_ocr::config::{self, Config};
use namecard_ocr::models::PipelineResult;
use namecard_ocr::pipeline::Pipeline;
use namecard_ocr::utils::logging;

/// 命令行参数
///
/// 用法: namecard-ocr [--verbose] [--env-file <path>] <图片路径>
struct CliArgs {
    image_path: PathBuf,
    env_file: PathBuf,
    verbose: bool,
}

fn parse_args() -> Result<CliArgs, String> {
    let mut image_path = None;
    let mut env_file = PathBuf::from(".env");
    let mut verbose = false;

    let mut args = std::env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--verbose" | "-v" => verbose = true,
            "--env-file" => {
                env_file = PathBuf::from(args.next().ok_or("--env-file 需要一个路径参数")?);
            }
            _ if image_path.is_none() => image_path = Some(PathBuf::from(arg)),
            other => return Err(format!("多余的参数: {}", other)),
        }
    }

    let image_path = image_path.ok_or_else(|| "需要图片路径参数".to_string())?;
    Ok(CliArgs {
        image_path,
        env_file,
        verbose,
    })
}

/// 输出最终结果
///
/// 结果 JSON 是程序唯一的功能性输出，固定写到 stdout 的一行，
/// 非 ASCII 字符保持原样不转义。
fn emit(result: &PipelineResult) {
    match serde_json::to_string(result) {
        Ok(line) => println!("{}", line),
        Err(e) => {
            // PipelineResult 的序列化不含不可序列化类型，理论上不可达
            eprintln!("结果序列化失败: {}", e);
            println!("{{\"error\":\"结果序列化失败\",\"success\":false}}");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = match parse_args() {
        Ok(args) => args,
        Err(msg) => {
            emit(&PipelineResult::failure(msg));
            return ExitCode::FAILURE;
        }
    };

    logging::init(args.verbose);

    if !args.image_path.exists() {
        emit(&PipelineResult::failure(format!(
            "图片文件不存在: {}",
            args.image_path.display()
        )));
        return ExitCode::FAILURE;
    }

    // 进程环境变量优先于 env 文件中的值
    let env_file_vars = config::load_env_file(&args.env_file);
    let mut config = Config::resolve(&env_file_vars);

    // 凭证预检查：失败时在任何网络调用之前以非零状态码退出
    if let Err(e) = config.validate() {
        emit(&PipelineResult::failure(e.to_string()));
        return ExitCode::FAILURE;
    }

    let pipeline = Pipeline::new(&config);
    let result = pipeline.run(&args.image_path).await;
    emit(&result);

    // 流程内部的失败已经以结构化结果的形式报告，进程本身正常退出
    ExitCode::SUCCESS
}
