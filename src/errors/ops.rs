use std::fmt::{self, Display};

/// 张量的运算符（用于错误提示）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    BiasAdd,
    MatMul,
    Concat,
    Split,
    Conv1d,
}
impl Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let operation_name = match self {
            Operator::Add => "相加",
            Operator::BiasAdd => "加偏置",
            Operator::MatMul => "矩阵相乘",
            Operator::Concat => "拼接",
            Operator::Split => "切分",
            Operator::Conv1d => "一维卷积",
        };
        write!(f, "{}", operation_name)
    }
}

