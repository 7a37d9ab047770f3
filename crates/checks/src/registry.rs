//! 检查名 → 已注册检查

use contracts::{check_names, CheckSpec, RegisteredCheck};
use tracing::info;

use crate::{SyntheticCheck, SyntheticPodCheck, SyntheticRealTimeCheck};

/// 按检查名构建检查，能力在此一次性确定
///
/// `process` 和 `container` 为双模式检查；`rtprocess`、`rtcontainer`
/// 单独配置时为仅实时检查。
pub fn build_checks(specs: &[CheckSpec]) -> Vec<RegisteredCheck> {
    specs
        .iter()
        .cloned()
        .map(|spec| match spec.name.as_str() {
            check_names::PROCESS => RegisteredCheck::with_real_time(SyntheticRealTimeCheck::new(
                spec,
                check_names::RT_PROCESS,
            )),
            check_names::CONTAINER => RegisteredCheck::with_real_time(
                SyntheticRealTimeCheck::new(spec, check_names::RT_CONTAINER),
            ),
            check_names::RT_PROCESS | check_names::RT_CONTAINER => {
                RegisteredCheck::basic(SyntheticCheck::real_time_only(spec))
            }
            check_names::POD => RegisteredCheck::basic(SyntheticPodCheck::new(spec)),
            _ => RegisteredCheck::basic(SyntheticCheck::new(spec)),
        })
        .collect()
}

/// 启用的检查名（双模式检查附带其实时名），并记录日志
pub fn enabled_check_names(checks: &[RegisteredCheck], run_real_time: bool) -> Vec<String> {
    let mut names = Vec::with_capacity(checks.len());
    for check in checks {
        names.push(check.name().to_string());
        if let Some(rt) = check.real_time_name().filter(|_| run_real_time) {
            names.push(rt.to_string());
        }
    }
    info!(checks = ?names, "Enabled checks");
    names
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs(names: &[&str]) -> Vec<CheckSpec> {
        names.iter().map(|n| CheckSpec::named(*n)).collect()
    }

    #[test]
    fn test_capabilities_by_name() {
        let checks = build_checks(&specs(&["process", "rtcontainer", "pod", "connections"]));

        assert_eq!(checks[0].real_time_name(), Some("rtprocess"));
        assert!(checks[1].real_time());
        assert!(checks[1].real_time_name().is_none());
        assert!(!checks[2].should_save_last_run());
        assert!(matches!(checks[3], RegisteredCheck::Basic(_)));
    }

    #[test]
    fn test_enabled_names_include_real_time_variant() {
        let checks = build_checks(&specs(&["process", "connections"]));
        assert_eq!(
            enabled_check_names(&checks, true),
            vec!["process", "rtprocess", "connections"]
        );
        assert_eq!(enabled_check_names(&checks, false), vec!["process", "connections"]);
    }
}
