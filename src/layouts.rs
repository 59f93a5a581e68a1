binary_layout::binary_layout!(dmx_frame_layout, BigEndian, {
    start_code: u8,
    slots: [u8],
});
