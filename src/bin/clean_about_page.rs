use std::process::ExitCode;

fn main() -> ExitCode {
    text_patcher::presets::run_standalone("clean-about-page")
}
