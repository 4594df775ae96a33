// 命令模板：`{}` 按顺序替换为转义后的参数
use crate::utils::error::{RaspinelError, Result};
use std::borrow::Cow;

/// POSIX shell 单引号转义，远程总是类 Unix 系统
pub fn quote(arg: &str) -> Cow<'_, str> {
    shell_escape::unix::escape(Cow::Borrowed(arg))
}

/// Substitutes every `{}` in `template` with the next quoted argument.
///
/// `{{` and `}}` produce literal braces. The number of placeholders must match
/// the number of arguments.
pub fn format_command<S: AsRef<str>>(template: &str, args: &[S]) -> Result<String> {
    let invalid = |reason: String| RaspinelError::InvalidTemplate {
        template: template.to_string(),
        reason,
    };

    let mut output = String::with_capacity(template.len());
    let mut args_iter = args.iter();
    let mut used = 0usize;
    let mut chars = template.chars().peekable();

    while let Some(c) = chars.next() {
        match (c, chars.peek()) {
            ('{', Some('{')) => {
                chars.next();
                output.push('{');
            }
            ('}', Some('}')) => {
                chars.next();
                output.push('}');
            }
            ('{', Some('}')) => {
                chars.next();
                let arg = args_iter.next().ok_or_else(|| {
                    invalid(format!("not enough arguments ({} given)", args.len()))
                })?;
                output.push_str(&quote(arg.as_ref()));
                used += 1;
            }
            ('{', _) => return Err(invalid("unmatched '{'".to_string())),
            ('}', _) => return Err(invalid("unmatched '}'".to_string())),
            _ => output.push(c),
        }
    }

    if used != args.len() {
        return Err(invalid(format!(
            "{} placeholders for {} arguments",
            used,
            args.len()
        )));
    }

    Ok(output)
}
