//! 调试器表达式
//!
//! 词法分析按优先级依次尝试一组锚定在当前位置的正则规则，
//! 求值在 token 区间上递归进行：先剥掉整体括号，再在最低优先级、
//! 最靠右的二元运算符处拆分。所有值都是 32 位无符号字。

use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;

use crate::memory::MemError;

/// 单个 token 的最大长度
pub const MAX_TOKEN_LEN: usize = 32;

/// Token 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
    Eq,
    Neq,
    And,
    Or,
    Dec,
    Hex,
    Reg,
    /// 一元 `*`
    Deref,
    /// 一元 `-`
    Neg,
}

impl TokenKind {
    fn is_operand_end(self) -> bool {
        matches!(self, TokenKind::Dec | TokenKind::Hex | TokenKind::Reg | TokenKind::RParen)
    }

    fn is_unary(self) -> bool {
        matches!(self, TokenKind::Deref | TokenKind::Neg)
    }

    /// 二元运算符的优先级，数字越大越先被拆分（即结合越松）
    fn binary_priority(self) -> Option<u8> {
        match self {
            TokenKind::And | TokenKind::Or => Some(4),
            TokenKind::Eq | TokenKind::Neq => Some(3),
            TokenKind::Plus | TokenKind::Minus => Some(2),
            TokenKind::Star | TokenKind::Slash => Some(1),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
}

/// 表达式错误，均可恢复
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExprError {
    #[error("no match at position {position}")]
    NoMatch { position: usize },
    #[error("token at position {position} is longer than {MAX_TOKEN_LEN} characters")]
    TokenTooLong { position: usize },
    #[error("unbalanced parentheses")]
    UnbalancedParens,
    #[error("malformed expression")]
    Malformed,
    #[error("invalid number '{0}'")]
    InvalidNumber(String),
    #[error("unknown register '{0}'")]
    UnknownRegister(String),
    #[error("division by zero")]
    DivideByZero,
    #[error("cannot read memory: {0}")]
    Memory(#[from] MemError),
}

/// 表达式求值所需的机器状态
pub trait EvalContext {
    /// 按名称读取寄存器（不含 `$`），支持 ABI 名、`0` 和 `pc`
    fn reg(&self, name: &str) -> Option<u32>;

    /// 读取一个 32 位字
    fn load_word(&self, addr: u32) -> Result<u32, MemError>;
}

static RULES: LazyLock<Vec<(Regex, Option<TokenKind>)>> = LazyLock::new(|| {
    [
        (r"^\s+", None),
        (r"^\+", Some(TokenKind::Plus)),
        (r"^==", Some(TokenKind::Eq)),
        (r"^!=", Some(TokenKind::Neq)),
        (r"^&&", Some(TokenKind::And)),
        (r"^\|\|", Some(TokenKind::Or)),
        (r"^0[xX][0-9a-fA-F]+", Some(TokenKind::Hex)),
        (r"^[0-9]+", Some(TokenKind::Dec)),
        (r"^\*", Some(TokenKind::Star)),
        (r"^/", Some(TokenKind::Slash)),
        (r"^\(", Some(TokenKind::LParen)),
        (r"^\)", Some(TokenKind::RParen)),
        (r"^-", Some(TokenKind::Minus)),
        // 多字符名在前，`$s10` 不会被拆成 `$s1` 和 `0`
        (
            r"^\$(zero|pc|s10|s11|ra|sp|gp|tp|t[0-6]|s[0-9]|a[0-7]|0)",
            Some(TokenKind::Reg),
        ),
    ]
    .into_iter()
    .map(|(pattern, kind)| (Regex::new(pattern).expect("invalid token rule"), kind))
    .collect()
});

/// 词法分析
///
/// 空白被丢弃；`*` 和 `-` 出现在表达式开头或非操作数之后时转为一元运算符。
pub fn tokenize(text: &str) -> Result<Vec<Token>, ExprError> {
    let mut tokens: Vec<Token> = Vec::new();
    let mut position = 0;

    while position < text.len() {
        let rest = &text[position..];
        let (len, kind) = RULES
            .iter()
            .find_map(|(re, kind)| re.find(rest).map(|m| (m.end(), *kind)))
            .ok_or(ExprError::NoMatch { position })?;

        log::trace!("match token {:?} at position {position}: {}", kind, &rest[..len]);

        if let Some(kind) = kind {
            if len > MAX_TOKEN_LEN {
                return Err(ExprError::TokenTooLong { position });
            }
            let prefix = tokens.last().is_none_or(|t| !t.kind.is_operand_end());
            let kind = match kind {
                TokenKind::Star if prefix => TokenKind::Deref,
                TokenKind::Minus if prefix => TokenKind::Neg,
                other => other,
            };
            tokens.push(Token {
                kind,
                text: rest[..len].to_string(),
            });
        }
        position += len;
    }

    Ok(tokens)
}

/// 对表达式求值
///
/// # 示例
///
/// ```
/// use sdb_sim::debugger::expr::{EvalContext, evaluate};
/// use sdb_sim::memory::MemError;
///
/// struct NoMachine;
///
/// impl EvalContext for NoMachine {
///     fn reg(&self, _name: &str) -> Option<u32> {
///         None
///     }
///
///     fn load_word(&self, addr: u32) -> Result<u32, MemError> {
///         Ok(addr)
///     }
/// }
///
/// assert_eq!(evaluate("2 + 3 * 4", &NoMachine), Ok(14));
/// assert_eq!(evaluate("(2 + 3) * 4", &NoMachine), Ok(20));
/// ```
pub fn evaluate(text: &str, ctx: &dyn EvalContext) -> Result<u32, ExprError> {
    let tokens = tokenize(text)?;
    if tokens.is_empty() {
        return Err(ExprError::Malformed);
    }
    check_balance(&tokens)?;
    Evaluator { tokens: &tokens, ctx }.eval(0, tokens.len() - 1)
}

fn check_balance(tokens: &[Token]) -> Result<(), ExprError> {
    let mut depth = 0usize;
    for t in tokens {
        match t.kind {
            TokenKind::LParen => depth += 1,
            TokenKind::RParen => {
                depth = depth.checked_sub(1).ok_or(ExprError::UnbalancedParens)?;
            }
            _ => {}
        }
    }
    if depth != 0 {
        return Err(ExprError::UnbalancedParens);
    }
    Ok(())
}

struct Evaluator<'a> {
    tokens: &'a [Token],
    ctx: &'a dyn EvalContext,
}

impl Evaluator<'_> {
    /// 对闭区间 `[p, q]` 求值
    fn eval(&self, p: usize, q: usize) -> Result<u32, ExprError> {
        if p > q {
            return Err(ExprError::Malformed);
        }
        if p == q {
            return self.operand(&self.tokens[p]);
        }
        if self.wrapped_in_parens(p, q) {
            return self.eval(p + 1, q - 1);
        }

        let Some(op) = self.find_major(p, q) else {
            // 没有二元运算符时只剩一元形式
            let value = self.eval(p + 1, q)?;
            return match self.tokens[p].kind {
                TokenKind::Deref => Ok(self.ctx.load_word(value)?),
                TokenKind::Neg => Ok(value.wrapping_neg()),
                _ => Err(ExprError::Malformed),
            };
        };

        if op == p || op == q {
            return Err(ExprError::Malformed);
        }
        let lhs = self.eval(p, op - 1)?;
        let rhs = self.eval(op + 1, q)?;

        let value = match self.tokens[op].kind {
            TokenKind::Plus => lhs.wrapping_add(rhs),
            TokenKind::Minus => lhs.wrapping_sub(rhs),
            TokenKind::Star => lhs.wrapping_mul(rhs),
            // 有符号除法，i32::MIN / -1 回绕
            TokenKind::Slash => match rhs {
                0 => return Err(ExprError::DivideByZero),
                _ => (lhs as i32).wrapping_div(rhs as i32) as u32,
            },
            TokenKind::Eq => (lhs == rhs) as u32,
            TokenKind::Neq => (lhs != rhs) as u32,
            TokenKind::And => (lhs != 0 && rhs != 0) as u32,
            TokenKind::Or => (lhs != 0 || rhs != 0) as u32,
            _ => return Err(ExprError::Malformed),
        };
        Ok(value)
    }

    fn operand(&self, token: &Token) -> Result<u32, ExprError> {
        let invalid = || ExprError::InvalidNumber(token.text.clone());
        match token.kind {
            TokenKind::Dec => token.text.parse().map_err(|_| invalid()),
            TokenKind::Hex => u32::from_str_radix(&token.text[2..], 16).map_err(|_| invalid()),
            TokenKind::Reg => {
                let name = &token.text[1..];
                self.ctx
                    .reg(name)
                    .ok_or_else(|| ExprError::UnknownRegister(name.to_string()))
            }
            _ => Err(ExprError::Malformed),
        }
    }

    /// `[p, q]` 是否被同一对括号整体包住
    fn wrapped_in_parens(&self, p: usize, q: usize) -> bool {
        if self.tokens[p].kind != TokenKind::LParen || self.tokens[q].kind != TokenKind::RParen {
            return false;
        }
        let mut depth = 0usize;
        for i in p..=q {
            match self.tokens[i].kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ => {}
            }
            if depth == 0 {
                return i == q;
            }
        }
        false
    }

    /// 找到括号外优先级最低的二元运算符，同级取最右
    fn find_major(&self, p: usize, q: usize) -> Option<usize> {
        let mut major: Option<(usize, u8)> = None;
        let mut depth = 0usize;

        for i in p..=q {
            let kind = self.tokens[i].kind;
            match kind {
                TokenKind::LParen => depth += 1,
                TokenKind::RParen => depth = depth.saturating_sub(1),
                _ if depth > 0 || kind.is_unary() => {}
                _ => match kind.binary_priority() {
                    Some(prio) if major.is_none_or(|(_, cur)| prio >= cur) => {
                        major = Some((i, prio));
                    }
                    _ => {}
                },
            }
        }

        major.map(|(i, _)| i)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::{FlatMemory, Memory};

    struct Machine {
        mem: FlatMemory,
        regs: Vec<(&'static str, u32)>,
    }

    impl Machine {
        fn new() -> Self {
            let mut mem = FlatMemory::new(0x100, 0x8000_0000);
            mem.store32(0x8000_0010, 0xDEAD_BEEF).unwrap();
            mem.store32(0x8000_0020, 0x8000_0010).unwrap();
            Self {
                mem,
                regs: vec![("pc", 0x8000_0000), ("0", 0), ("a0", 7), ("sp", 0x8000_0020), ("s10", 3)],
            }
        }
    }

    impl EvalContext for Machine {
        fn reg(&self, name: &str) -> Option<u32> {
            self.regs.iter().find(|(n, _)| *n == name).map(|(_, v)| *v)
        }

        fn load_word(&self, addr: u32) -> Result<u32, MemError> {
            self.mem.load32(addr)
        }
    }

    fn eval(text: &str) -> Result<u32, ExprError> {
        evaluate(text, &Machine::new())
    }

    fn kinds(text: &str) -> Vec<TokenKind> {
        tokenize(text).unwrap().into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_tokenize_skips_whitespace() {
        use TokenKind::*;
        assert_eq!(kinds(" 1 +\t0x1f "), vec![Dec, Plus, Hex]);
        assert_eq!(kinds("$a0==$pc"), vec![Reg, Eq, Reg]);
        assert_eq!(kinds("1!=2&&3||4"), vec![Dec, Neq, Dec, And, Dec, Or, Dec]);
    }

    #[test]
    fn test_tokenize_unary() {
        use TokenKind::*;
        assert_eq!(kinds("*$sp"), vec![Deref, Reg]);
        assert_eq!(kinds("2*-3"), vec![Dec, Star, Neg, Dec]);
        assert_eq!(kinds("(1)-*2"), vec![LParen, Dec, RParen, Minus, Deref, Dec]);
    }

    #[test]
    fn test_tokenize_register_longest_first() {
        let tokens = tokenize("$s10").unwrap();
        assert_eq!(tokens.len(), 1);
        assert_eq!(tokens[0].text, "$s10");
    }

    #[test]
    fn test_tokenize_failure() {
        assert_eq!(tokenize("1 @ 2"), Err(ExprError::NoMatch { position: 2 }));
        assert!(tokenize("$x5").is_err());
        assert_eq!(
            tokenize(&"1".repeat(40)),
            Err(ExprError::TokenTooLong { position: 0 })
        );
    }

    #[test]
    fn test_precedence() {
        assert_eq!(eval("2+3*4"), Ok(14));
        assert_eq!(eval("(2+3)*4"), Ok(20));
        assert_eq!(eval("1==1&&2!=3"), Ok(1));
        assert_eq!(eval("1+1==2"), Ok(1));
    }

    #[test]
    fn test_left_associative() {
        assert_eq!(eval("10-4-3"), Ok(3));
        assert_eq!(eval("100/10/5"), Ok(2));
        assert_eq!(eval("8/2*2"), Ok(8));
    }

    #[test]
    fn test_nested_parentheses() {
        assert_eq!(eval("((1+2)*(3+4))"), Ok(21));
        assert_eq!(eval("(1+2)*(3+4)"), Ok(21));
    }

    #[test]
    fn test_registers_and_deref() {
        assert_eq!(eval("$a0 * 2"), Ok(14));
        assert_eq!(eval("$pc"), Ok(0x8000_0000));
        assert_eq!(eval("$0"), Ok(0));
        assert_eq!(eval("$s10"), Ok(3));
        assert_eq!(eval("*0x80000010"), Ok(0xDEAD_BEEF));
        assert_eq!(eval("**$sp"), Ok(0xDEAD_BEEF));
        assert_eq!(eval("*($pc + 16) == 0xdeadbeef"), Ok(1));
    }

    #[test]
    fn test_unary_minus_wraps() {
        assert_eq!(eval("-1"), Ok(u32::MAX));
        assert_eq!(eval("--1"), Ok(1));
        assert_eq!(eval("2*-3"), Ok((-6i32) as u32));
        assert_eq!(eval("-(1+2)*3"), Ok((-9i32) as u32));
    }

    #[test]
    fn test_arithmetic_wraps() {
        assert_eq!(eval("0xffffffff + 2"), Ok(1));
        assert_eq!(eval("0x10000 * 0x10000"), Ok(0));
        assert_eq!(eval("0 - 1"), Ok(u32::MAX));
    }

    #[test]
    fn test_division_is_signed() {
        assert_eq!(eval("-8/2"), Ok(-4i32 as u32));
        assert_eq!(eval("7/2"), Ok(3));
        assert_eq!(eval("0 - 7 / 2"), Ok(-3i32 as u32));
        assert_eq!(eval("0xffffffff / 0xffffffff"), Ok(1));
        assert_eq!(eval("0x80000000 / -1"), Ok(0x8000_0000));
    }

    #[test]
    fn test_divide_by_zero() {
        assert_eq!(eval("1/0"), Err(ExprError::DivideByZero));
        assert_eq!(eval("4/(2-2)"), Err(ExprError::DivideByZero));
    }

    #[test]
    fn test_malformed_expressions() {
        assert_eq!(eval("(1+2"), Err(ExprError::UnbalancedParens));
        assert_eq!(eval("1+2)"), Err(ExprError::UnbalancedParens));
        assert_eq!(eval(")("), Err(ExprError::UnbalancedParens));
        assert_eq!(eval(""), Err(ExprError::Malformed));
        assert_eq!(eval("   "), Err(ExprError::Malformed));
        assert_eq!(eval("1 2"), Err(ExprError::Malformed));
        assert_eq!(eval("1 +"), Err(ExprError::Malformed));
        assert_eq!(eval("()"), Err(ExprError::Malformed));
        assert_eq!(eval("4294967296"), Err(ExprError::InvalidNumber("4294967296".into())));
    }

    #[test]
    fn test_memory_error_is_recoverable() {
        assert!(matches!(eval("*0x10"), Err(ExprError::Memory(_))));
    }

    #[test]
    fn test_unknown_register() {
        let empty = Machine {
            mem: FlatMemory::new(4, 0),
            regs: Vec::new(),
        };
        assert_eq!(
            evaluate("$t0", &empty),
            Err(ExprError::UnknownRegister("t0".into()))
        );
    }
}
