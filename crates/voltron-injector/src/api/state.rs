use injector_admission::admitter::Admitter;

pub(crate) struct ApiServerState {
    pub(crate) admitter: Box<dyn Admitter>,
}
