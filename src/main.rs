use std::process::ExitCode;
use std::sync::Arc;

use gateway_chain::logging::init_logging;
use gateway_chain::server::{Gateway, GatewayOptions, ServerListener};
use gateway_chain::settings::Settings;
use tracing::{error, info};

#[tokio::main]
async fn main() -> ExitCode {
    let settings = match Settings::load().await {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("설정 로드 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let _guard = match init_logging(&settings.logging) {
        Ok(guard) => guard,
        Err(e) => {
            eprintln!("로깅 초기화 실패: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let gateway = match Gateway::from_settings(&settings, GatewayOptions::default()) {
        Ok(gateway) => Arc::new(gateway),
        Err(e) => {
            error!(error = %e, "미들웨어 체인 조립 실패");
            return ExitCode::FAILURE;
        }
    };
    info!(apis = gateway.routes().len(), "게이트웨이 준비 완료");

    let listener = match ServerListener::bind(&settings.server).await {
        Ok(listener) => listener,
        Err(e) => {
            error!(error = %e, "리스너 생성 실패");
            return ExitCode::FAILURE;
        }
    };

    let shutdown = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "종료 시그널 대기 실패");
        }
    };

    match listener.run(gateway, shutdown).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "서버 실행 실패");
            ExitCode::FAILURE
        }
    }
}
