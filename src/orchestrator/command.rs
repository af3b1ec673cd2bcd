//! 控制台命令解析

use crate::models::letter_position;

/// 答题者可以输入的命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// 显示知识点目录
    Topics,
    /// 显示模拟考试目录
    Exams,
    /// 按关键字过滤目录，空字符串表示清除过滤
    Filter(String),
    /// 选择第 n 个目录项（从 1 开始）
    Pick(usize),
    Start,
    Next,
    Prev,
    /// 跳转到第 n 题（从 1 开始）
    Go(usize),
    /// 为当前题目选择选项（从 0 开始的位置）
    Answer(usize),
    Clear,
    Flag,
    Finish,
    /// 查看结果后开始新的一轮
    New,
    Reload,
    Help,
    Quit,
}

impl Command {
    /// 解析一行输入，无法识别时返回提示信息
    pub fn parse(line: &str) -> Result<Self, String> {
        let line = line.trim();
        let (head, rest) = match line.split_once(char::is_whitespace) {
            Some((head, rest)) => (head, rest.trim()),
            None => (line, ""),
        };

        let command = match head.to_ascii_lowercase().as_str() {
            "topics" | "t" => Command::Topics,
            "exams" | "e" => Command::Exams,
            "filter" | "f" => Command::Filter(rest.to_string()),
            "pick" | "p" => Command::Pick(parse_ordinal(rest)?),
            "start" | "s" => Command::Start,
            "next" | "n" => Command::Next,
            "prev" | "b" => Command::Prev,
            "go" | "g" => Command::Go(parse_ordinal(rest)?),
            "answer" | "a" => {
                let position =
                    letter_position(rest).ok_or_else(|| format!("无效的选项: '{}'", rest))?;
                Command::Answer(position)
            }
            "clear" | "c" => Command::Clear,
            "flag" => Command::Flag,
            "finish" => Command::Finish,
            "new" => Command::New,
            "reload" => Command::Reload,
            "help" | "?" | "h" => Command::Help,
            "quit" | "q" | "exit" => Command::Quit,
            "" => return Err("请输入命令，输入 help 查看帮助".to_string()),
            other => return Err(format!("未知命令: '{}'，输入 help 查看帮助", other)),
        };
        Ok(command)
    }
}

/// 解析从 1 开始的序号
fn parse_ordinal(text: &str) -> Result<usize, String> {
    match text.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("需要从 1 开始的序号，收到: '{}'", text)),
    }
}

pub const HELP: &str = "\
命令:
  topics | exams          显示知识点 / 模拟考试目录
  filter <关键字>          过滤目录（不带关键字清除过滤）
  pick <n>                选择第 n 项
  start                   开始答题
  next | prev | go <n>    切换题目
  answer <A-Z>            为当前题目选择选项
  clear | flag            清除答案 / 标记待复查
  finish                  交卷
  new                     开始新的一轮
  reload                  重新加载目录
  quit                    退出";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("pick 3"), Ok(Command::Pick(3)));
        assert_eq!(Command::parse("  A   b "), Ok(Command::Answer(1)));
        assert_eq!(Command::parse("go 10"), Ok(Command::Go(10)));
        assert_eq!(
            Command::parse("filter 函数 图像"),
            Ok(Command::Filter("函数 图像".to_string()))
        );
        assert_eq!(Command::parse("filter"), Ok(Command::Filter(String::new())));
        assert_eq!(Command::parse("QUIT"), Ok(Command::Quit));
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        assert!(Command::parse("").is_err());
        assert!(Command::parse("pick 0").is_err());
        assert!(Command::parse("go x").is_err());
        assert!(Command::parse("answer 7").is_err());
        assert!(Command::parse("dance").is_err());
    }
}
