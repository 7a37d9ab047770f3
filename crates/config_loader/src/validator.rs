//! 配置校验模块
//!
//! 校验规则：
//! - 字段级约束（`validator` derive）：hostname 非空、检查名非空
//! - 检查名唯一
//! - 间隔覆盖值 > 0
//! - drop 列表不含空项
//! - file forwarder 必须配置 `base_path`

use std::collections::HashSet;

use contracts::{AgentConfig, ContractError, ForwarderKind};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

/// 校验 AgentConfig 配置
///
/// 返回第一个遇到的错误，或 Ok(())。
pub fn validate(config: &AgentConfig) -> Result<(), ContractError> {
    validate_fields(config)?;
    validate_check_names(config)?;
    validate_intervals(config)?;
    validate_drop_list(config)?;
    validate_forwarder(config)?;
    Ok(())
}

/// derive 规则
fn validate_fields(config: &AgentConfig) -> Result<(), ContractError> {
    config
        .validate()
        .map_err(|errors| first_violation(String::new(), &errors))
}

/// 把嵌套的 ValidationErrors 展开成第一个字段错误
fn first_violation(prefix: String, errors: &ValidationErrors) -> ContractError {
    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{prefix}.{field}")
        };
        match kind {
            ValidationErrorsKind::Field(violations) => {
                let message = violations
                    .first()
                    .and_then(|v| v.message.as_ref().map(|m| m.to_string()))
                    .unwrap_or_else(|| "invalid value".to_string());
                return ContractError::config_validation(path, message);
            }
            ValidationErrorsKind::Struct(inner) => return first_violation(path, inner),
            ValidationErrorsKind::List(items) => {
                if let Some((idx, inner)) = items.iter().next() {
                    return first_violation(format!("{path}[{idx}]"), inner);
                }
            }
        }
    }
    ContractError::config_validation(prefix, "invalid configuration")
}

/// 校验检查名唯一性
fn validate_check_names(config: &AgentConfig) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for check in &config.checks {
        if !seen.insert(check.name.as_str()) {
            return Err(ContractError::config_validation(
                format!("checks[name={}]", check.name),
                "duplicate check name",
            ));
        }
    }
    Ok(())
}

/// 校验间隔覆盖值
fn validate_intervals(config: &AgentConfig) -> Result<(), ContractError> {
    for (name, secs) in &config.check_intervals {
        if *secs == 0 {
            return Err(ContractError::config_validation(
                format!("check_intervals.{name}"),
                "interval must be > 0 seconds",
            ));
        }
    }
    Ok(())
}

/// 校验 drop 列表
fn validate_drop_list(config: &AgentConfig) -> Result<(), ContractError> {
    for (idx, name) in config.drop_check_payloads.iter().enumerate() {
        if name.trim().is_empty() {
            return Err(ContractError::config_validation(
                format!("drop_check_payloads[{idx}]"),
                "check name cannot be empty",
            ));
        }
    }
    Ok(())
}

/// 校验 forwarder 配置
fn validate_forwarder(config: &AgentConfig) -> Result<(), ContractError> {
    let forwarder = &config.forwarder;
    if forwarder.kind == ForwarderKind::File
        && forwarder
            .params
            .get("base_path")
            .is_none_or(|p| p.trim().is_empty())
    {
        return Err(ContractError::config_validation(
            "forwarder.params.base_path",
            "file forwarder requires base_path",
        ));
    }
    Ok(())
}
