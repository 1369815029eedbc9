//! Request script command

use fftacc_core::Register;
use fftacc_host::{config::parse_number, AcceleratorHandle, Request, Response};
use std::path::Path;

fn number(tok: Option<&str>, what: &str) -> Result<u32, String> {
    let tok = tok.ok_or_else(|| format!("missing {}", what))?;
    parse_number(tok).map_err(|e| format!("{}: {}", what, e))
}

fn register(tok: Option<&str>) -> Result<Register, String> {
    let tok = tok.ok_or("missing register name")?;
    Register::from_name(tok).ok_or_else(|| format!("unknown register '{}'", tok))
}

/// Parse one request line; `Ok(None)` for blank lines and comments
pub fn parse_request(line: &str) -> Result<Option<Request>, String> {
    let line = line.split('#').next().unwrap_or("").trim();
    let mut tokens = line.split_whitespace();
    let Some(verb) = tokens.next() else {
        return Ok(None);
    };

    let request = match verb.to_ascii_lowercase().as_str() {
        "reset" => Request::Reset,
        "configure" | "cfg" => Request::Configure(number(tokens.next(), "CFG0 value")?),
        "load" => Request::LoadSample(number(tokens.next(), "sample word")?),
        "process" => Request::Process,
        "result" => Request::ReadResult,
        "get" => Request::Get(register(tokens.next())?),
        "set" => {
            let reg = register(tokens.next())?;
            Request::Set(reg, number(tokens.next(), "value")?)
        }
        "code" => {
            let code = number(tokens.next(), "request code")?;
            let arg = tokens.next().map(parse_number).transpose()?.unwrap_or(0);
            Request::from_code(code, arg).map_err(|e| e.to_string())?
        }
        "ioctl" => {
            let nr = number(tokens.next(), "ioctl number")?;
            let arg = tokens.next().map(parse_number).transpose()?.unwrap_or(0);
            Request::from_ioctl(nr, arg).map_err(|e| e.to_string())?
        }
        other => return Err(format!("unknown request '{}'", other)),
    };

    if let Some(extra) = tokens.next() {
        return Err(format!("unexpected '{}'", extra));
    }
    Ok(Some(request))
}

/// Execute requests from a script file or the command line
pub fn cmd_exec(
    handle: &AcceleratorHandle,
    script: Option<&Path>,
    inline: &[String],
) -> Result<(), Box<dyn std::error::Error>> {
    let lines: Vec<String> = match script {
        Some(path) => std::fs::read_to_string(path)?
            .lines()
            .map(str::to_string)
            .collect(),
        None => inline.to_vec(),
    };

    let mut session = handle.open_session()?;
    for (i, line) in lines.iter().enumerate() {
        let request = parse_request(line).map_err(|e| format!("line {}: {}", i + 1, e))?;
        let Some(request) = request else {
            continue;
        };

        match session.execute(request)? {
            Response::Done => println!("{:?}: ok", request),
            Response::Value(v) => println!("{:?}: 0x{:08X} ({})", request, v, v),
            Response::Status(s) => println!("{:?}: status {:?}", request, s),
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_request() {
        assert_eq!(parse_request("reset").unwrap(), Some(Request::Reset));
        assert_eq!(parse_request("  # comment").unwrap(), None);
        assert_eq!(parse_request("").unwrap(), None);
        assert_eq!(
            parse_request("load 0x5DC # first sample").unwrap(),
            Some(Request::LoadSample(1500))
        );
        assert_eq!(
            parse_request("set ctrl 0x3").unwrap(),
            Some(Request::Set(Register::Ctrl, 3))
        );
        assert_eq!(
            parse_request("get status").unwrap(),
            Some(Request::Get(Register::Status))
        );
        assert_eq!(
            parse_request("code 0x70 7").unwrap(),
            Some(Request::Set(Register::DataIn, 7))
        );
        assert_eq!(parse_request("ioctl 5").unwrap(), Some(Request::ReadResult));

        assert!(parse_request("load").is_err());
        assert!(parse_request("get nothing").is_err());
        assert!(parse_request("process now").is_err());
        assert!(parse_request("jump 3").is_err());
        assert!(parse_request("code 0x90").is_err());
    }
}
