//! Generator -> Parser round trips over whole connections
