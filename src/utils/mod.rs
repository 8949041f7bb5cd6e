//! # 常用接口模块
//!
//! 本模块提供测试断言宏等通用工具
