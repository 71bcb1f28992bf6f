use serde::{Deserialize, Serialize};
use std::fmt::Display;

use super::Operation;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Problem {
    #[serde(rename = "type")]
    pub operation: Operation,
    #[serde(rename = "a")]
    pub operand_a: i32,
    #[serde(rename = "b")]
    pub operand_b: i32,
    pub result: i32,
    pub text: String,
}

impl Problem {
    pub fn new(operation: Operation, operand_a: i32, operand_b: i32) -> Self {
        Self {
            operation,
            operand_a,
            operand_b,
            result: operation.apply(operand_a, operand_b),
            text: format!("{} {} {} = ", operand_a, operation.symbol(), operand_b),
        }
    }

    pub fn addition(operand_a: i32, operand_b: i32) -> Self {
        Self::new(Operation::Addition, operand_a, operand_b)
    }

    pub fn subtraction(operand_a: i32, operand_b: i32) -> Self {
        Self::new(Operation::Subtraction, operand_a, operand_b)
    }

    pub fn is_answered_by(&self, answer: i32) -> bool {
        self.result == answer
    }
}

impl Display for Problem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.text, self.result)
    }
}

/// A problem the player got wrong, with what they answered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct MissedProblem {
    #[serde(rename = "example")]
    pub problem: Problem,
    pub user_answer: i32,
}
