//! 翻译结果句柄
//!
//! 每个后台翻译只交付一次结果。任务在当前 tokio 运行时上执行；没有运行时时，
//! 在独立线程上创建单线程运行时（带 IO 和定时器驱动），网络访问照常可用。
//! 任务内部 panic 或被丢弃时，句柄以原文完成，回调同样以原文调用。

use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::oneshot;

use crate::translation::provider::panic_message;

/// 只完成一次的翻译结果
#[must_use = "句柄不被等待时结果会被丢弃"]
#[derive(Debug)]
pub struct TranslationHandle {
    state: HandleState,
}

#[derive(Debug)]
enum HandleState {
    Ready(Option<Vec<String>>),
    Pending {
        receiver: oneshot::Receiver<Vec<String>>,
        fallback: Option<Vec<String>>,
    },
}

impl TranslationHandle {
    /// 已完成的句柄
    pub fn ready(lines: Vec<String>) -> Self {
        Self {
            state: HandleState::Ready(Some(lines)),
        }
    }

    fn pending(receiver: oneshot::Receiver<Vec<String>>, fallback: Vec<String>) -> Self {
        Self {
            state: HandleState::Pending {
                receiver,
                fallback: Some(fallback),
            },
        }
    }
}

impl Future for TranslationHandle {
    type Output = Vec<String>;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match &mut self.get_mut().state {
            HandleState::Ready(lines) => Poll::Ready(lines.take().unwrap_or_default()),
            HandleState::Pending { receiver, fallback } => match Pin::new(receiver).poll(cx) {
                Poll::Ready(Ok(lines)) => Poll::Ready(lines),
                Poll::Ready(Err(_)) => {
                    tracing::warn!("翻译任务在交付结果前结束，返回原文");
                    Poll::Ready(fallback.take().unwrap_or_default())
                }
                Poll::Pending => Poll::Pending,
            },
        }
    }
}

/// 在后台执行翻译并返回句柄
pub(crate) fn spawn_translation(
    task: BoxFuture<'static, Vec<String>>,
    fallback: Vec<String>,
) -> TranslationHandle {
    let (sender, receiver) = oneshot::channel();
    let guard = fallback.clone();
    run_detached(async move {
        // 接收方已被丢弃时结果无人需要
        let _ = sender.send(guarded(task, guard).await);
    });
    TranslationHandle::pending(receiver, fallback)
}

/// 在后台执行翻译，完成后调用一次回调
pub(crate) fn spawn_with_callback<F>(
    task: BoxFuture<'static, Vec<String>>,
    fallback: Vec<String>,
    on_complete: F,
) where
    F: FnOnce(Vec<String>) + Send + 'static,
{
    run_detached(async move {
        on_complete(guarded(task, fallback).await);
    });
}

async fn guarded(task: BoxFuture<'static, Vec<String>>, fallback: Vec<String>) -> Vec<String> {
    match AssertUnwindSafe(task).catch_unwind().await {
        Ok(lines) => lines,
        Err(panic) => {
            tracing::error!("翻译任务 panic，返回原文: {}", panic_message(panic.as_ref()));
            fallback
        }
    }
}

fn run_detached(task: impl Future<Output = ()> + Send + 'static) {
    match tokio::runtime::Handle::try_current() {
        Ok(runtime) => {
            runtime.spawn(task);
        }
        Err(_) => {
            tracing::debug!("当前没有 tokio 运行时，在独立线程上创建运行时执行翻译");
            std::thread::spawn(move || {
                match tokio::runtime::Builder::new_current_thread()
                    .enable_all()
                    .build()
                {
                    Ok(runtime) => runtime.block_on(task),
                    Err(e) => {
                        // 没有 reactor 时网络请求会失败，任务仍会以原文完成
                        tracing::error!("创建 tokio 运行时失败: {}", e);
                        futures::executor::block_on(task);
                    }
                }
            });
        }
    }
}
