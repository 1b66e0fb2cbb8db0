pub mod api;
pub mod websocket;

use crate::config::prompt::PromptConfig;
use crate::transport::ChatTransport;
use std::error::Error;
use std::sync::Arc;
use log::info;

use self::api::AppState;

/// Widget surface settings; the widget server only runs when these are set.
pub struct WidgetConfig {
    pub addr: String,
    pub transport: Arc<dyn ChatTransport>,
    pub prompts: Arc<PromptConfig>,
}

pub struct Server {
    addr: String,
    state: AppState,
    tls: Option<(String, String)>,
    widget: Option<WidgetConfig>,
}

impl Server {
    pub fn new(
        addr: String,
        state: AppState,
        tls: Option<(String, String)>,
        widget: Option<WidgetConfig>,
    ) -> Self {
        Self {
            addr,
            state,
            tls,
            widget,
        }
    }

    pub async fn run(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        let http = api::start_http_server(&self.addr, self.state, self.tls);

        match self.widget {
            Some(widget) => {
                info!("Chat widget enabled on {}", widget.addr);
                let ws = websocket::start_ws_server(&widget.addr, widget.transport, widget.prompts);
                tokio::try_join!(http, ws)?;
            }
            None => http.await?,
        }

        Ok(())
    }
}
